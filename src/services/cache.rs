//! In-memory directory snapshots
//!
//! Each collection is held as an immutable map behind an `ArcSwap`, so
//! readers never block. Full snapshots are only written by
//! [`CacheLoader`]; services apply single-entry updates after the store has
//! acknowledged a write.
//!
//! Every refresh takes a generation ticket when it starts. Single-entry
//! updates and newer refreshes bump the generation, and a refresh whose
//! ticket is no longer current is discarded when it finishes.

use crate::core::models::{Client, Plant, Region, User};
use crate::storage::{Collection, Document, DocumentStore};
use crate::utils::error::Result;
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, warn};

/// Records that can be cached by id
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for User {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Region {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Client {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Plant {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Handle for one in-flight refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Freshness of a cached collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// Set when the last refresh failed and older data is being served
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// At least one refresh has been applied
    pub loaded: bool,
}

/// One cached collection
#[derive(Debug)]
pub struct CachedCollection<T> {
    data: ArcSwap<BTreeMap<String, T>>,
    generation: AtomicU64,
    /// Serializes snapshot writers
    write_lock: Mutex<()>,
    status: RwLock<CacheStatus>,
}

impl<T> Default for CachedCollection<T> {
    fn default() -> Self {
        Self {
            data: ArcSwap::from_pointee(BTreeMap::new()),
            generation: AtomicU64::new(0),
            write_lock: Mutex::new(()),
            status: RwLock::new(CacheStatus::default()),
        }
    }
}

impl<T: Keyed + Clone> CachedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock-free view of the current map
    pub fn snapshot(&self) -> Arc<BTreeMap<String, T>> {
        self.data.load_full()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.data.load().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.data.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> CacheStatus {
        self.status.read().clone()
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply a refresh result if its ticket is still current.
    ///
    /// A failed refresh keeps the previous data and marks the collection
    /// stale. Returns whether the result was applied.
    pub fn finish_refresh(
        &self,
        ticket: RefreshTicket,
        result: std::result::Result<Vec<T>, String>,
    ) -> bool {
        let _guard = self.write_lock.lock();
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            debug!("Discarding refresh {:?}, a newer write happened", ticket);
            return false;
        }

        match result {
            Ok(records) => {
                let map = records
                    .into_iter()
                    .map(|record| (record.key().to_string(), record))
                    .collect();
                self.data.store(Arc::new(map));
                *self.status.write() = CacheStatus {
                    stale: false,
                    error: None,
                    loaded: true,
                };
            }
            Err(message) => {
                let mut status = self.status.write();
                status.stale = true;
                status.error = Some(message);
            }
        }
        true
    }

    /// Insert or replace one record
    pub fn upsert(&self, record: T) {
        let _guard = self.write_lock.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut map = BTreeMap::clone(&self.data.load());
        map.insert(record.key().to_string(), record);
        self.data.store(Arc::new(map));
    }

    pub fn remove(&self, id: &str) {
        let _guard = self.write_lock.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut map = BTreeMap::clone(&self.data.load());
        map.remove(id);
        self.data.store(Arc::new(map));
    }
}

/// Snapshots of all four directories
#[derive(Debug, Default)]
pub struct DirectoryCache {
    pub users: CachedCollection<User>,
    pub regions: CachedCollection<Region>,
    pub clients: CachedCollection<Client>,
    pub plants: CachedCollection<Plant>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of a region, if cached
    pub fn region_name(&self, id: &str) -> Option<String> {
        self.regions.get(id).map(|r| r.name)
    }

    /// Name of a client, if cached
    pub fn client_name(&self, id: &str) -> Option<String> {
        self.clients.get(id).map(|c| c.name)
    }
}

/// Records the loader knows how to fetch
pub trait Cacheable: Keyed + Clone + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn cached(cache: &DirectoryCache) -> &CachedCollection<Self>;

    /// Fold legacy fields into their current names
    fn normalize(&mut self);

    /// Decode a stored document
    fn from_document(doc: &Document) -> Result<Self> {
        let mut record: Self = doc.parse()?;
        record.normalize();
        Ok(record)
    }
}

impl Cacheable for User {
    const COLLECTION: Collection = Collection::Users;

    fn cached(cache: &DirectoryCache) -> &CachedCollection<Self> {
        &cache.users
    }

    fn normalize(&mut self) {
        self.audit.normalize();
    }
}

impl Cacheable for Region {
    const COLLECTION: Collection = Collection::Regions;

    fn cached(cache: &DirectoryCache) -> &CachedCollection<Self> {
        &cache.regions
    }

    fn normalize(&mut self) {
        self.audit.normalize();
    }
}

impl Cacheable for Client {
    const COLLECTION: Collection = Collection::Clients;

    fn cached(cache: &DirectoryCache) -> &CachedCollection<Self> {
        &cache.clients
    }

    fn normalize(&mut self) {
        self.audit.normalize();
    }
}

impl Cacheable for Plant {
    const COLLECTION: Collection = Collection::Plants;

    fn cached(cache: &DirectoryCache) -> &CachedCollection<Self> {
        &cache.plants
    }

    fn normalize(&mut self) {
        self.audit.normalize();
    }
}

/// Loads full snapshots from the store into the cache
#[derive(Clone)]
pub struct CacheLoader {
    store: Arc<dyn DocumentStore>,
    cache: Arc<DirectoryCache>,
}

impl std::fmt::Debug for CacheLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLoader")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl CacheLoader {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<DirectoryCache>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &Arc<DirectoryCache> {
        &self.cache
    }

    /// Reload one collection. Undecodable documents are skipped.
    ///
    /// A store failure is recorded on the collection and returned; the
    /// previous snapshot stays in place.
    pub async fn refresh<T: Cacheable>(&self) -> Result<()> {
        let cached = T::cached(&self.cache);
        let ticket = cached.begin_refresh();

        match self.store.list(T::COLLECTION).await {
            Ok(docs) => {
                let records = docs
                    .iter()
                    .filter_map(|doc| match T::from_document(doc) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            warn!("Skipping unreadable {} {}: {}", T::COLLECTION, doc.id, e);
                            None
                        }
                    })
                    .collect();
                cached.finish_refresh(ticket, Ok(records));
                Ok(())
            }
            Err(e) => {
                error!("Failed to load {}: {}", T::COLLECTION, e);
                cached.finish_refresh(ticket, Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// Reload every directory, continuing past failures
    pub async fn refresh_all(&self) -> Result<()> {
        let results = [
            self.refresh::<User>().await,
            self.refresh::<Region>().await,
            self.refresh::<Client>().await,
            self.refresh::<Plant>().await,
        ];
        results.into_iter().collect()
    }
}
