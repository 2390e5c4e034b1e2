//! Application state shared across HTTP handlers

use crate::auth::AuthSystem;
use crate::config::Config;
use crate::core::ids::IdGenerator;
use crate::core::models::{Client, Plant, Region};
use crate::services::{
    AccessStore, CacheLoader, DirectoryCache, DirectoryService, SearchService, UserService,
};
use crate::storage::DocumentStore;
use std::sync::Arc;
use std::time::Instant;

/// HTTP server state shared across handlers
///
/// Every service holds the same store handle and directory cache, so a
/// write through one service is visible to the others' listings.
#[derive(Clone)]
pub struct AppState {
    /// Dashboard configuration (shared read-only)
    pub config: Arc<Config>,
    /// Document store
    pub store: Arc<dyn DocumentStore>,
    /// Sessions and credentials
    pub auth: Arc<AuthSystem>,
    /// Last good snapshots of every collection
    pub cache: Arc<DirectoryCache>,
    pub loader: CacheLoader,
    pub users: UserService,
    pub access: AccessStore,
    pub regions: DirectoryService<Region>,
    pub clients: DirectoryService<Client>,
    pub plants: DirectoryService<Plant>,
    pub search: SearchService,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Wire every service over one store
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let auth = Arc::new(AuthSystem::new(config.auth(), store.clone()));
        let cache = Arc::new(DirectoryCache::new());
        let loader = CacheLoader::new(store.clone(), cache.clone());
        let ids = Arc::new(IdGenerator::new(config.storage().id_max_attempts));

        Self {
            users: UserService::new(store.clone(), loader.clone(), auth.provisioner()),
            access: AccessStore::new(store.clone(), loader.clone()),
            regions: DirectoryService::new(store.clone(), loader.clone(), ids.clone()),
            clients: DirectoryService::new(store.clone(), loader.clone(), ids.clone()),
            plants: DirectoryService::new(store.clone(), loader.clone(), ids),
            search: SearchService::new(loader.clone()),
            config: Arc::new(config),
            store,
            auth,
            cache,
            loader,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
