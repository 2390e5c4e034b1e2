//! Role resolution

use super::types::{Principal, Role};
use tracing::warn;

/// Derive the role label of a principal.
///
/// Super-admin wins, then a non-empty client map, then a non-empty region
/// map. Anonymous and unreadable principals are `default`.
pub fn resolve_role(principal: &Principal) -> Role {
    let user = match principal {
        Principal::Anonymous => return Role::Default,
        Principal::Unreadable(cause) => {
            warn!("Resolving role for unreadable user: {}", cause);
            return Role::Default;
        }
        Principal::Known(user) => user,
    };

    if user.is_super_admin() {
        Role::SuperAdmin
    } else if !user.client_access.is_empty() {
        Role::ClientAdmin
    } else if !user.region_access.is_empty() {
        Role::RegionAdmin
    } else {
        Role::Default
    }
}
