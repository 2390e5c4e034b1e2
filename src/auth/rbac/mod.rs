//! Role and permission model
//!
//! Roles are derived from the user record, per-resource grants come from the
//! user's region/client access maps, and module/action capabilities come
//! from flat flags. Every check is a pure function of a [`Principal`] and
//! returns a typed decision instead of an error; unreadable users are
//! treated as having no access.

mod permissions;
mod roles;
mod types;

pub use crate::core::models::{Action, Capability, Module, ResourceKind};
pub use permissions::{
    CapabilitySummary, can, can_access_users, can_add_clients, can_add_plants, can_add_regions,
    can_delete_clients, can_delete_plants, can_delete_regions, check_capability,
    evaluate_access, evaluate_plant_access,
};
pub use roles::resolve_role;
pub use types::{
    AccessDecision, AccessEvaluation, DenialReason, GateDecision, GrantSource, Principal, Role,
};
