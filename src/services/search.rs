//! Global search over the cached directories
//!
//! Every record is matched field by field on its top-level string and
//! number values. Results pass the same read checks the listings apply.

use super::Listing;
use super::cache::{CacheLoader, Cacheable};
use super::directory::DirectoryRecord;
use crate::auth::rbac::{self, Principal};
use crate::core::models::{Client, Plant, Region, User};
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Shorter queries return nothing
pub const MIN_QUERY_CHARS: usize = 2;

/// One field that contained the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    /// `name`, else `email`, else `Unnamed`
    pub name: String,
    /// `Client`, `Plant`, `Region` or `User`
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub matched_in: Vec<FieldMatch>,
}

#[derive(Clone)]
pub struct SearchService {
    loader: CacheLoader,
}

impl SearchService {
    pub fn new(loader: CacheLoader) -> Self {
        Self { loader }
    }

    /// Case-insensitive substring search across every directory the
    /// principal can read. Users are included for user administrators only.
    pub async fn search(&self, principal: &Principal, query: &str) -> Result<Listing<SearchHit>> {
        let mut listing = Listing::fresh(Vec::new());
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(listing);
        }
        let needle = query.to_lowercase();

        self.collect::<Client>(&mut listing, &needle, "Client", |c| {
            c.access_for(principal).can_read()
        })
        .await;
        self.collect::<Plant>(&mut listing, &needle, "Plant", |p| {
            p.access_for(principal).can_read()
        })
        .await;
        self.collect::<Region>(&mut listing, &needle, "Region", |r| {
            r.access_for(principal).can_read()
        })
        .await;
        if rbac::can_access_users(principal) {
            self.collect::<User>(&mut listing, &needle, "User", |_| true).await;
        }

        debug!("Search for {:?} matched {} records", query, listing.items.len());
        Ok(listing)
    }

    /// Append the visible matches from one collection, loading it first if
    /// nothing has been loaded yet
    async fn collect<T>(
        &self,
        listing: &mut Listing<SearchHit>,
        needle: &str,
        kind: &'static str,
        visible: impl Fn(&T) -> bool,
    ) where
        T: Cacheable + Serialize,
    {
        let cached = T::cached(self.loader.cache());
        if !cached.status().loaded {
            if let Err(e) = self.loader.refresh::<T>().await {
                warn!("Searching without {}: {}", T::COLLECTION, e);
            }
        }

        let status = cached.status();
        listing.stale |= status.stale;
        if listing.error.is_none() {
            listing.error = status.error;
        }

        let snapshot = cached.snapshot();
        listing.items.extend(
            snapshot
                .values()
                .filter(|record| visible(*record))
                .filter_map(|record| match_record(record, kind, needle)),
        );
    }
}

fn match_record<T: Serialize>(record: &T, kind: &'static str, needle: &str) -> Option<SearchHit> {
    let Ok(Value::Object(fields)) = serde_json::to_value(record) else {
        return None;
    };

    let matched_in: Vec<FieldMatch> = fields
        .iter()
        .filter_map(|(field, value)| {
            let text = searchable_text(value)?;
            text.to_lowercase().contains(needle).then(|| FieldMatch {
                field: field.clone(),
                value: text,
            })
        })
        .collect();
    if matched_in.is_empty() {
        return None;
    }

    Some(SearchHit {
        id: text_field(&fields, "id").unwrap_or_default().to_string(),
        name: text_field(&fields, "name")
            .or_else(|| text_field(&fields, "email"))
            .unwrap_or("Unnamed")
            .to_string(),
        kind,
        matched_in,
    })
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Strings and numbers are searchable; whole floats print without `.0`
fn searchable_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        _ => None,
    }
}
