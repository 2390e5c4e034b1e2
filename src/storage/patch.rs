//! Field-level document patches
//!
//! A patch is an ordered list of set/remove operations on nested paths.
//! Access grants are patched one entry at a time (`regionAccess` / `R1`)
//! so concurrent edits of different entries do not overwrite each other.

use crate::utils::error::{DashboardError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// One patch operation
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Set(Value),
    Remove,
}

/// Ordered set of field operations applied atomically by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    ops: Vec<(Vec<String>, PatchOp)>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a top-level field
    pub fn set<V: Serialize>(self, field: &str, value: V) -> Result<Self> {
        self.set_path(&[field], value)
    }

    /// Set a nested field, creating intermediate objects
    pub fn set_path<V: Serialize>(mut self, path: &[&str], value: V) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        self.ops.push((owned(path)?, PatchOp::Set(value)));
        Ok(self)
    }

    /// Remove a top-level field
    pub fn remove(self, field: &str) -> Result<Self> {
        self.remove_path(&[field])
    }

    /// Remove a nested field; missing paths are ignored
    pub fn remove_path(mut self, path: &[&str]) -> Result<Self> {
        self.ops.push((owned(path)?, PatchOp::Remove));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Apply all operations in order
    pub fn apply(&self, data: &mut Map<String, Value>) -> Result<()> {
        for (path, op) in &self.ops {
            apply_one(data, path, op)?;
        }
        Ok(())
    }
}

fn owned(path: &[&str]) -> Result<Vec<String>> {
    if path.is_empty() || path.iter().any(|segment| segment.is_empty()) {
        return Err(DashboardError::internal("Empty patch path"));
    }
    Ok(path.iter().map(|segment| segment.to_string()).collect())
}

fn apply_one(data: &mut Map<String, Value>, path: &[String], op: &PatchOp) -> Result<()> {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut current = data;
    for segment in parents {
        if matches!(op, PatchOp::Remove) && !current.contains_key(segment) {
            return Ok(());
        }
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => {
                return Err(DashboardError::bad_request(format!(
                    "Cannot patch through non-object field '{}'",
                    segment
                )));
            }
        };
    }

    match op {
        PatchOp::Set(value) => {
            current.insert(last.clone(), value.clone());
        }
        PatchOp::Remove => {
            current.remove(last);
        }
    }
    Ok(())
}
