//! SeaORM-backed document store
//!
//! All collections share one `documents` table keyed by `(collection, id)`.
//! Updates are read-patch-write rounds; the write only lands when the row
//! still carries the version that was read. Without an expected version a
//! round that lost against a concurrent writer is replayed on the new row.

pub mod entities;
pub mod migration;

use super::{Collection, Document, DocumentStore, FieldPatch, already_exists, version_conflict};
use crate::config::DatabaseConfig;
use crate::utils::error::{DashboardError, Result};
use crate::utils::time::now_millis;
use async_trait::async_trait;
use entities::document;
use migration::Migrator;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Document store over a SQL database
#[derive(Debug, Clone)]
pub struct SeaOrmDocumentStore {
    db: DatabaseConnection,
}

impl SeaOrmDocumentStore {
    /// Connect using the configured pool settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.is_sqlite() {
            ensure_sqlite_dir(&config.url)?;
        }

        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(config.connection_timeout.max(1) * 2))
            .idle_timeout(Duration::from_secs(600))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let db = Database::connect(opt).await?;
        info!(
            "Database connection established ({:?})",
            db.get_database_backend()
        );
        Ok(Self { db })
    }

    /// Wrap an existing connection
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Run pending migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");
        Migrator::up(&self.db, None).await?;
        Ok(())
    }

    fn key(collection: Collection, id: &str) -> (String, String) {
        (collection.as_str().to_string(), id.to_string())
    }

    /// One read-patch-write round guarded by the version that was read
    async fn try_update(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
        expected_version: Option<i64>,
    ) -> Result<UpdateAttempt> {
        let current = match document::Entity::find_by_id(Self::key(collection, id))
            .one(&self.db)
            .await
        {
            Ok(current) => current,
            Err(e) if is_busy(&e) => return Ok(UpdateAttempt::Busy),
            Err(e) => return Err(e.into()),
        }
        .ok_or_else(|| DashboardError::not_found(format!("{}/{} not found", collection, id)))?;

        if expected_version.is_some_and(|expected| expected != current.version) {
            return Err(version_conflict(collection, id));
        }

        let read_version = current.version;
        let mut doc = into_document(current)?;
        patch.apply(&mut doc.data)?;
        doc.version = read_version + 1;

        let result = document::Entity::update_many()
            .col_expr(
                document::Column::Data,
                Expr::value(Value::Object(doc.data.clone())),
            )
            .col_expr(document::Column::Version, Expr::value(doc.version))
            .col_expr(document::Column::UpdatedAt, Expr::value(now_millis()))
            .filter(document::Column::Collection.eq(collection.as_str()))
            .filter(document::Column::Id.eq(id))
            .filter(document::Column::Version.eq(read_version))
            .exec(&self.db)
            .await;

        match result {
            Ok(result) if result.rows_affected == 0 => Ok(UpdateAttempt::Stale),
            Ok(_) => Ok(UpdateAttempt::Written(doc)),
            Err(e) if is_busy(&e) => Ok(UpdateAttempt::Busy),
            Err(e) => Err(e.into()),
        }
    }
}

/// Create the parent directory of a file-backed SQLite URL
fn ensure_sqlite_dir(url: &str) -> Result<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DashboardError::Internal(format!("Failed to create data directory: {}", e))
            })?;
        }
    }
    Ok(())
}

/// Rounds of read-patch-write before a contended update gives up
const UPDATE_ATTEMPTS: u32 = 32;

enum UpdateAttempt {
    Written(Document),
    /// The row moved past the version that was read
    Stale,
    /// The database refused the write because of a concurrent writer
    Busy,
}

/// SQLite reports lock contention as `SQLITE_BUSY` (5) or `SQLITE_LOCKED` (6)
fn is_busy(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("database is locked")
        || message.contains("(code: 5)")
        || message.contains("(code: 6)")
}

fn retry_delay(attempt: u32) -> Duration {
    let base = 2u64 << attempt.min(5);
    Duration::from_millis(base + rand::thread_rng().gen_range(0..base))
}

fn into_document(model: document::Model) -> Result<Document> {
    match model.data {
        Value::Object(data) => Ok(Document {
            id: model.id,
            data,
            version: model.version,
        }),
        _ => Err(DashboardError::internal(format!(
            "Stored document {}/{} is not an object",
            model.collection, model.id
        ))),
    }
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        if self.exists(collection, id).await? {
            return Err(already_exists(collection, id));
        }

        let now = now_millis();
        let model = document::ActiveModel {
            collection: Set(collection.as_str().to_string()),
            id: Set(id.to_string()),
            data: Set(Value::Object(data.clone())),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match document::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => {
                debug!("Created {}/{}", collection, id);
                Ok(Document {
                    id: id.to_string(),
                    data,
                    version: 1,
                })
            }
            // Lost a race against a concurrent create of the same id
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(already_exists(collection, id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        document::Entity::find_by_id(Self::key(collection, id))
            .one(&self.db)
            .await?
            .map(into_document)
            .transpose()
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        document::Entity::find()
            .filter(document::Column::Collection.eq(collection.as_str()))
            .order_by_asc(document::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(into_document)
            .collect()
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
        expected_version: Option<i64>,
    ) -> Result<Document> {
        for attempt in 0..UPDATE_ATTEMPTS {
            match self.try_update(collection, id, patch, expected_version).await? {
                UpdateAttempt::Written(doc) => {
                    debug!("Updated {}/{} to version {}", collection, id, doc.version);
                    return Ok(doc);
                }
                // Someone else wrote after the caller's read
                UpdateAttempt::Stale if expected_version.is_some() => {
                    return Err(version_conflict(collection, id));
                }
                UpdateAttempt::Stale => {
                    debug!("Concurrent write on {}/{}, reapplying patch", collection, id);
                }
                UpdateAttempt::Busy => {
                    debug!("Database busy while updating {}/{}", collection, id);
                }
            }
            tokio::time::sleep(retry_delay(attempt)).await;
        }

        warn!(
            "Giving up on {}/{} after {} contended attempts",
            collection, id, UPDATE_ATTEMPTS
        );
        Err(DashboardError::unavailable(format!(
            "{}/{} is being modified concurrently, please retry",
            collection, id
        )))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let result = document::Entity::delete_many()
            .filter(document::Column::Collection.eq(collection.as_str()))
            .filter(document::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        debug!("Deleted {}/{}: {}", collection, id, result.rows_affected);
        Ok(result.rows_affected > 0)
    }

    async fn health_check(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| DashboardError::unavailable(format!("Database ping failed: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        match self.db.get_database_backend() {
            DbBackend::Sqlite => "sqlite",
            DbBackend::Postgres => "postgres",
            DbBackend::MySql => "mysql",
        }
    }
}
