//! Resource access evaluation and capability gates

use super::roles::resolve_role;
use super::types::{AccessEvaluation, DenialReason, GateDecision, GrantSource, Principal, Role};
use crate::core::models::{Action, Capability, Module, Plant, ResourceAccess, ResourceKind, User};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

fn known<'a>(principal: &'a Principal) -> Result<&'a User, DenialReason> {
    match principal {
        Principal::Anonymous => Err(DenialReason::Unauthenticated),
        Principal::Unreadable(cause) => {
            debug!("Denying unreadable user: {}", cause);
            Err(DenialReason::UnreadableUser)
        }
        Principal::Known(user) => Ok(user),
    }
}

/// Evaluate the access a principal holds on one region or client
pub fn evaluate_access(
    principal: &Principal,
    resource_id: &str,
    kind: ResourceKind,
) -> AccessEvaluation {
    let user = match known(principal) {
        Ok(user) => user,
        Err(reason) => return AccessEvaluation::denied(reason),
    };

    if user.is_super_admin() {
        return AccessEvaluation::granted(ResourceAccess::FULL, GrantSource::SuperAdmin);
    }

    match user.access_map(kind).get(resource_id) {
        Some(access) if !access.is_none() => {
            AccessEvaluation::granted(*access, GrantSource::AccessMap)
        }
        Some(_) => {
            debug!("User {} holds an empty grant on {} {}", user.id, kind, resource_id);
            AccessEvaluation::denied(DenialReason::NoGrant)
        }
        None => {
            debug!("User {} has no entry for {} {}", user.id, kind, resource_id);
            AccessEvaluation::denied(DenialReason::NoEntry)
        }
    }
}

/// Access on a plant is the union of access on its region and its client
pub fn evaluate_plant_access(principal: &Principal, plant: &Plant) -> AccessEvaluation {
    let user = match known(principal) {
        Ok(user) => user,
        Err(reason) => return AccessEvaluation::denied(reason),
    };

    if user.is_super_admin() {
        return AccessEvaluation::granted(ResourceAccess::FULL, GrantSource::SuperAdmin);
    }

    let via = |kind: ResourceKind, id: Option<&String>| {
        id.and_then(|id| user.access_map(kind).get(id)).copied()
    };
    let region = via(ResourceKind::Region, plant.region_id.as_ref());
    let client = via(ResourceKind::Client, plant.client_id.as_ref());

    match (region, client) {
        (None, None) => AccessEvaluation::denied(DenialReason::NoEntry),
        (r, c) => {
            let access = r.unwrap_or_default().union(c.unwrap_or_default());
            if access.is_none() {
                AccessEvaluation::denied(DenialReason::NoGrant)
            } else {
                AccessEvaluation::granted(access, GrantSource::AccessMap)
            }
        }
    }
}

/// Gate one module/action capability
pub fn check_capability(principal: &Principal, capability: Capability) -> GateDecision {
    let user = match known(principal) {
        Ok(user) => user,
        Err(reason) => return GateDecision::Denied(reason),
    };

    if user.is_super_admin() {
        GateDecision::Allowed(GrantSource::SuperAdmin)
    } else if user.capabilities.is_set(capability) {
        GateDecision::Allowed(GrantSource::CapabilityFlag)
    } else {
        debug!("User {} lacks {}", user.id, capability);
        GateDecision::Denied(DenialReason::FlagNotSet)
    }
}

/// Flag set or super-admin
pub fn can(principal: &Principal, capability: Capability) -> bool {
    check_capability(principal, capability).is_allowed()
}

/// User management is super-admin only
pub fn can_access_users(principal: &Principal) -> bool {
    principal.is_super_admin()
}

pub fn can_add_clients(principal: &Principal) -> bool {
    can(principal, Capability::new(Module::Clients, Action::Create))
}

pub fn can_delete_clients(principal: &Principal) -> bool {
    can(principal, Capability::new(Module::Clients, Action::Delete))
}

pub fn can_add_regions(principal: &Principal) -> bool {
    can(principal, Capability::new(Module::Regions, Action::Create))
}

pub fn can_delete_regions(principal: &Principal) -> bool {
    can(principal, Capability::new(Module::Regions, Action::Delete))
}

pub fn can_add_plants(principal: &Principal) -> bool {
    can(principal, Capability::new(Module::Plants, Action::Create))
}

pub fn can_delete_plants(principal: &Principal) -> bool {
    can(principal, Capability::new(Module::Plants, Action::Delete))
}

/// What the dashboard shows or hides for the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySummary {
    pub role: Role,
    pub can_access_users: bool,
    /// Keyed by stored flag name
    pub capabilities: BTreeMap<String, bool>,
}

impl CapabilitySummary {
    pub fn for_principal(principal: &Principal) -> Self {
        Self {
            role: resolve_role(principal),
            can_access_users: can_access_users(principal),
            capabilities: Capability::ALL
                .into_iter()
                .map(|capability| (capability.flag_name(), can(principal, capability)))
                .collect(),
        }
    }
}
