//! User management and self-service profile edits

use super::cache::{CacheLoader, Cacheable};
use super::{Listing, Versioned, merge_changes};
use crate::auth::AccountProvisioner;
use crate::auth::rbac::{self, Principal};
use crate::config::BootstrapAdmin;
use crate::core::models::{AuditFields, Capability, SUPER_ADMIN_ACC, User, UserProfile};
use crate::storage::{Collection, DocumentStore, FieldPatch, to_document_data};
use crate::utils::error::{DashboardError, FieldErrors, Result};
use crate::utils::time::now_millis;
use crate::utils::validation::{Validator, normalize_email};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Input for creating a user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub super_admin: bool,
}

fn validate_profile(profile: &UserProfile) -> Result<()> {
    Validator::new()
        .name("name", &profile.name, 2, 50)
        .phone("phone", &profile.phone)
        .notes("notes", &profile.notes)
        .finish()
}

/// Fields an administrator may change besides the profile
const ADMIN_FIELDS: &[&str] = &["acc"];

/// Users directory
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
    loader: CacheLoader,
    accounts: Arc<dyn AccountProvisioner>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        loader: CacheLoader,
        accounts: Arc<dyn AccountProvisioner>,
    ) -> Self {
        Self {
            store,
            loader,
            accounts,
        }
    }

    fn require_user_admin(principal: &Principal) -> Result<()> {
        if rbac::can_access_users(principal) {
            Ok(())
        } else {
            Err(DashboardError::access_denied())
        }
    }

    async fn load(&self, id: &str) -> Result<Versioned<User>> {
        let doc = self
            .store
            .get(Collection::Users, id)
            .await?
            .ok_or_else(|| DashboardError::not_found("User not found"))?;
        let record = User::from_document(&doc)?;
        Ok(Versioned {
            record,
            version: doc.version,
        })
    }

    /// Principal for a signed-in uid; lookup failures fail closed
    pub async fn principal(&self, uid: &str) -> Principal {
        let lookup = match self.store.get(Collection::Users, uid).await {
            Ok(Some(doc)) => User::from_document(&doc).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        Principal::from_lookup(uid, lookup)
    }

    pub async fn list(&self, principal: &Principal) -> Result<Listing<User>> {
        Self::require_user_admin(principal)?;

        let refreshed = self.loader.refresh::<User>().await;
        let cached = &self.loader.cache().users;
        let status = cached.status();
        if refreshed.is_err() && !status.loaded {
            return Err(DashboardError::unavailable("Could not load users"));
        }

        Ok(Listing {
            items: cached.snapshot().values().cloned().collect(),
            stale: status.stale,
            error: status.error,
        })
    }

    pub async fn get(&self, principal: &Principal, id: &str) -> Result<Versioned<User>> {
        Self::require_user_admin(principal)?;
        self.load(id).await
    }

    /// Caller's own record
    pub async fn me(&self, principal: &Principal) -> Result<Versioned<User>> {
        match principal {
            Principal::Known(user) => self.load(&user.id).await,
            Principal::Anonymous => Err(DashboardError::auth("Not signed in")),
            Principal::Unreadable(_) => Err(DashboardError::unavailable(
                "Your user record could not be loaded",
            )),
        }
    }

    /// Provision an identity, then write the record.
    ///
    /// If the record write fails the identity is deleted again.
    pub async fn create(&self, principal: &Principal, input: NewUser) -> Result<User> {
        Self::require_user_admin(principal)?;

        let email = normalize_email(&input.email);
        let mut errors = FieldErrors::new();
        for check in [
            Validator::new()
                .email("email", &email)
                .password("password", &input.password)
                .finish(),
            validate_profile(&input.profile),
        ] {
            match check {
                Ok(()) => {}
                Err(DashboardError::Validation(fields)) => errors.extend(fields),
                Err(e) => return Err(e),
            }
        }
        if !errors.is_empty() {
            return Err(DashboardError::Validation(errors));
        }

        let uid = self.accounts.create_account(&email, &input.password).await?;

        let user = User {
            id: uid.clone(),
            email,
            profile: input.profile,
            acc: input.super_admin.then(|| SUPER_ADMIN_ACC.to_string()),
            audit: AuditFields::created(principal.actor(), now_millis()),
            ..Default::default()
        };

        let written = async {
            let mut data = to_document_data(&user)?;
            data.remove("id");
            self.store.create(Collection::Users, &uid, data).await
        }
        .await;

        if let Err(e) = written {
            error!("Failed to write user record {}: {}", uid, e);
            if let Err(cleanup) = self.accounts.delete_account(&uid).await {
                error!("Failed to remove orphaned account {}: {}", uid, cleanup);
            }
            return Err(e);
        }

        self.loader.cache().users.upsert(user.clone());
        info!("Created user {} by {}", uid, principal.actor());
        Ok(user)
    }

    async fn apply(
        &self,
        id: &str,
        patch: FieldPatch,
        actor: &str,
        expected_version: Option<i64>,
    ) -> Result<Versioned<User>> {
        let patch = patch
            .set("updatedAt", now_millis())?
            .set("updatedBy", actor)?;
        let doc = self
            .store
            .update(Collection::Users, id, &patch, expected_version)
            .await?;
        let record = User::from_document(&doc)?;
        self.loader.cache().users.upsert(record.clone());
        Ok(Versioned {
            record,
            version: doc.version,
        })
    }

    /// Administrative edit of profile fields and the role discriminator
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        changes: &Map<String, Value>,
        expected_version: Option<i64>,
    ) -> Result<Versioned<User>> {
        Self::require_user_admin(principal)?;

        if let Some(acc) = changes.get("acc") {
            if !(acc.is_null() || acc.as_str() == Some(SUPER_ADMIN_ACC)) {
                return Err(DashboardError::invalid_field(
                    "acc",
                    "Role must be super_admin or empty",
                ));
            }
        }

        let current = self.load(id).await?;
        let allowed: Vec<&str> = UserProfile::FIELDS
            .iter()
            .chain(ADMIN_FIELDS)
            .copied()
            .collect();
        let (merged, patch) = merge_changes(&current.record, changes, &allowed)?;
        validate_profile(&merged.profile)?;

        let updated = self
            .apply(id, patch, principal.actor(), expected_version)
            .await?;
        info!("Updated user {} by {}", id, principal.actor());
        Ok(updated)
    }

    /// Self-service profile edit
    pub async fn update_profile(
        &self,
        principal: &Principal,
        changes: &Map<String, Value>,
    ) -> Result<Versioned<User>> {
        let current = self.me(principal).await?;
        let (merged, patch) = merge_changes(&current.record, changes, UserProfile::FIELDS)?;
        validate_profile(&merged.profile)?;

        self.apply(&current.record.id, patch, principal.actor(), None)
            .await
    }

    /// Change capability flags; `None` clears a flag
    pub async fn set_capabilities(
        &self,
        principal: &Principal,
        id: &str,
        changes: &BTreeMap<String, Option<bool>>,
        expected_version: Option<i64>,
    ) -> Result<Versioned<User>> {
        Self::require_user_admin(principal)?;

        let mut errors = FieldErrors::new();
        let mut patch = FieldPatch::new();
        for (flag, value) in changes {
            match Capability::from_flag_name(flag) {
                Some(capability) => {
                    let name = capability.flag_name();
                    patch = match value {
                        Some(value) => patch.set(&name, value)?,
                        None => patch.remove(&name)?,
                    };
                }
                None => errors.add(flag.as_str(), "Unknown capability"),
            }
        }
        if !errors.is_empty() {
            return Err(DashboardError::Validation(errors));
        }
        if patch.is_empty() {
            return Err(DashboardError::bad_request("No capability changes given"));
        }

        let updated = self
            .apply(id, patch, principal.actor(), expected_version)
            .await?;
        info!("Capabilities of user {} changed by {}", id, principal.actor());
        Ok(updated)
    }

    /// Remove the identity, then the record
    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<()> {
        Self::require_user_admin(principal)?;
        if principal.user().is_some_and(|me| me.id == id) {
            return Err(DashboardError::bad_request("You cannot delete your own account"));
        }

        if !self.store.exists(Collection::Users, id).await? {
            return Err(DashboardError::not_found("User not found"));
        }

        self.accounts.delete_account(id).await?;
        self.store.delete(Collection::Users, id).await?;
        self.loader.cache().users.remove(id);
        info!("Deleted user {} by {}", id, principal.actor());
        Ok(())
    }

    /// Create a super-admin when no users exist yet
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<bool> {
        if !self.store.list(Collection::Users).await?.is_empty() {
            return Ok(false);
        }

        let system = Principal::Known(User {
            id: "bootstrap".to_string(),
            email: "system".to_string(),
            acc: Some(SUPER_ADMIN_ACC.to_string()),
            ..Default::default()
        });
        let input = NewUser {
            email: admin.email.clone(),
            password: admin.password.clone(),
            profile: UserProfile {
                name: admin.name.clone(),
                ..Default::default()
            },
            super_admin: true,
        };

        match self.create(&system, input).await {
            Ok(user) => {
                info!("Bootstrap administrator {} created", user.email);
                Ok(true)
            }
            Err(DashboardError::Conflict(_)) => {
                warn!("Bootstrap administrator account exists without a user record");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
