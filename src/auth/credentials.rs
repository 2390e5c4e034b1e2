//! Email/password identities
//!
//! Identities live in the `credentials` collection keyed by normalized
//! email. The uid of an identity is also the id of its user record.

use super::password::{hash_password, verify_password};
use crate::storage::{Collection, DocumentStore, FieldPatch, to_document_data};
use crate::utils::error::{DashboardError, Result};
use crate::utils::time::now_millis;
use crate::utils::validation::{Validator, normalize_email};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Creates and removes auth identities for user management
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountProvisioner: Send + Sync {
    /// Create an identity and return its uid
    async fn create_account(&self, email: &str, password: &str) -> Result<String>;

    /// Remove an identity; a missing identity is not an error
    async fn delete_account(&self, uid: &str) -> Result<()>;
}

/// Stored identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Credential lookup and verification over the document store
pub struct CredentialStore {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl CredentialStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Credential>> {
        self.store
            .get(Collection::Credentials, &normalize_email(email))
            .await?
            .map(|doc| doc.parse())
            .transpose()
    }

    pub async fn find_by_uid(&self, uid: &str) -> Result<Option<Credential>> {
        for doc in self.store.list(Collection::Credentials).await? {
            let credential: Credential = doc.parse()?;
            if credential.uid == uid {
                return Ok(Some(credential));
            }
        }
        Ok(None)
    }

    /// Check an email/password pair
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Credential> {
        let credential = self.find_by_email(email).await?;
        match credential {
            Some(credential) if verify_password(password, &credential.password_hash)? => {
                Ok(credential)
            }
            _ => Err(DashboardError::auth("Invalid email or password")),
        }
    }

    /// Replace the password after re-checking the current one
    pub async fn change_password(&self, uid: &str, current: &str, new: &str) -> Result<()> {
        Validator::new().password("newPassword", new).finish()?;

        let credential = self
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| DashboardError::not_found("Account not found"))?;

        if !verify_password(current, &credential.password_hash)? {
            return Err(DashboardError::auth("Current password is incorrect"));
        }

        let patch = FieldPatch::new().set("passwordHash", hash_password(new)?)?;
        self.store
            .update(Collection::Credentials, &credential.email, &patch, None)
            .await?;

        info!("Password changed for user: {}", uid);
        Ok(())
    }
}

#[async_trait]
impl AccountProvisioner for CredentialStore {
    async fn create_account(&self, email: &str, password: &str) -> Result<String> {
        let email = normalize_email(email);
        Validator::new()
            .email("email", &email)
            .password("password", password)
            .finish()?;

        if self.store.exists(Collection::Credentials, &email).await? {
            return Err(DashboardError::conflict(
                "An account with this email already exists",
            ));
        }

        let credential = Credential {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            created_at: now_millis(),
        };
        self.store
            .create(
                Collection::Credentials,
                &email,
                to_document_data(&credential)?,
            )
            .await?;

        debug!("Created account {} for {}", credential.uid, email);
        Ok(credential.uid)
    }

    async fn delete_account(&self, uid: &str) -> Result<()> {
        match self.find_by_uid(uid).await? {
            Some(credential) => {
                self.store
                    .delete(Collection::Credentials, &credential.email)
                    .await?;
                info!("Deleted account {}", uid);
            }
            None => warn!("No account to delete for uid {}", uid),
        }
        Ok(())
    }
}
