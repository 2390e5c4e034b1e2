//! Module/action capability flags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dashboard areas guarded by capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Clients,
    Regions,
    Plants,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::Clients, Module::Regions, Module::Plants];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Clients => "clients",
            Module::Regions => "regions",
            Module::Plants => "plants",
        }
    }
}

/// Actions guarded per module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Delete,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Create, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Delete => "delete",
        }
    }
}

/// One cell of the module x action table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability {
    pub module: Module,
    pub action: Action,
}

impl Capability {
    /// Every capability, in table order
    pub const ALL: [Capability; 6] = [
        Capability::new(Module::Clients, Action::Create),
        Capability::new(Module::Clients, Action::Delete),
        Capability::new(Module::Regions, Action::Create),
        Capability::new(Module::Regions, Action::Delete),
        Capability::new(Module::Plants, Action::Create),
        Capability::new(Module::Plants, Action::Delete),
    ];

    pub const fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }

    /// Stored flag name, e.g. `clients_create`
    pub fn flag_name(&self) -> String {
        format!("{}_{}", self.module.as_str(), self.action.as_str())
    }

    /// Inverse of [`Capability::flag_name`]
    pub fn from_flag_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.flag_name() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.module.as_str(), self.action.as_str())
    }
}

/// Capability flags as stored on the user record; absent means not granted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients_create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions_create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plants_create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plants_delete: Option<bool>,
}

impl CapabilityFlags {
    fn slot(&self, capability: Capability) -> &Option<bool> {
        match (capability.module, capability.action) {
            (Module::Clients, Action::Create) => &self.clients_create,
            (Module::Clients, Action::Delete) => &self.clients_delete,
            (Module::Regions, Action::Create) => &self.regions_create,
            (Module::Regions, Action::Delete) => &self.regions_delete,
            (Module::Plants, Action::Create) => &self.plants_create,
            (Module::Plants, Action::Delete) => &self.plants_delete,
        }
    }

    fn slot_mut(&mut self, capability: Capability) -> &mut Option<bool> {
        match (capability.module, capability.action) {
            (Module::Clients, Action::Create) => &mut self.clients_create,
            (Module::Clients, Action::Delete) => &mut self.clients_delete,
            (Module::Regions, Action::Create) => &mut self.regions_create,
            (Module::Regions, Action::Delete) => &mut self.regions_delete,
            (Module::Plants, Action::Create) => &mut self.plants_create,
            (Module::Plants, Action::Delete) => &mut self.plants_delete,
        }
    }

    /// Stored value, if any
    pub fn get(&self, capability: Capability) -> Option<bool> {
        *self.slot(capability)
    }

    /// True only when the flag is explicitly set
    pub fn is_set(&self, capability: Capability) -> bool {
        self.get(capability) == Some(true)
    }

    pub fn set(&mut self, capability: Capability, value: Option<bool>) {
        *self.slot_mut(capability) = value;
    }
}
