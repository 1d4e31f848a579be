//! Resource synchronization
//!
//! A [`Synchronizer`] owns the in-memory copy of one remote resource and keeps
//! it in step with the cache store and the backend:
//!
//! - `load()` answers from memory or the cache store and then refreshes from
//!   the backend in the background (stale-while-revalidate).
//! - `update()` writes through the backend, one write at a time. A call made
//!   while another write is in flight returns `Ok(None)` without touching the
//!   network.
//! - After a successful write, dependent caches registered for the mutated
//!   fields are invalidated. Their failures are logged and never surface.
//!
//! Every successful write and every reset bumps an epoch. A background
//! refresh that started under an older epoch is discarded when it completes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use networking::FetchError;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use storage::json::{read_json, remove_quietly, write_json};
use storage::{CacheStore, StorageError};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

/// Synchronization errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Backend request failed
    #[error("Remote request failed: {0}")]
    Remote(#[from] FetchError),

    /// Cache store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A dependent cache could not be refreshed
    #[error("Dependent invalidation failed: {0}")]
    Invalidation(String),
}

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// A remote resource managed by a [`Synchronizer`]
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// The resource's value
    type Value: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// A change that can be written to the backend
    type Mutation: Send + Sync + 'static;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Cache store key holding the serialized value
    fn cache_key(&self) -> String;

    /// Fetch the current value from the backend
    async fn fetch(&self) -> std::result::Result<Self::Value, FetchError>;

    /// Write a mutation to the backend and return the resulting value
    ///
    /// `current` is the in-memory value when the write started.
    async fn apply(
        &self,
        current: Option<Self::Value>,
        mutation: &Self::Mutation,
    ) -> std::result::Result<Self::Value, FetchError>;

    /// Fields changed by a mutation, used to select dependent caches
    fn touched_fields(&self, mutation: &Self::Mutation) -> Vec<&'static str>;
}

/// A cache derived from a resource's value
#[async_trait]
pub trait DependentCache<V>: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Bring the derived cache in line with a freshly written value
    async fn invalidate(&self, value: &V) -> Result<()>;
}

/// Where the current value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing loaded yet
    Idle,
    /// Read from the cache store, not yet confirmed by the backend
    Cached,
    /// Confirmed by the backend
    Fresh,
    /// The last refresh failed; the value may be outdated
    Stale,
}

/// Point-in-time view of a synchronizer, published to subscribers
#[derive(Debug, Clone)]
pub struct SyncSnapshot<V> {
    /// Current value
    pub value: Option<V>,
    /// Provenance of `value`
    pub status: SyncStatus,
    /// A background refresh is running
    pub refreshing: bool,
    /// A write is in flight
    pub writing: bool,
    /// Error from the last failed refresh
    pub last_error: Option<FetchError>,
    /// When `value` was last replaced
    pub updated_at: Option<DateTime<Utc>>,
}

impl<V> SyncSnapshot<V> {
    fn empty() -> Self {
        Self {
            value: None,
            status: SyncStatus::Idle,
            refreshing: false,
            writing: false,
            last_error: None,
            updated_at: None,
        }
    }
}

/// Result of a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched value replaced the current one
    Applied,
    /// The fetch failed; the previous value was kept
    Failed(FetchError),
    /// Another refresh was already running
    Skipped,
    /// A write or reset happened while fetching; the result was dropped
    Discarded,
}

struct Dependent<V> {
    fields: Vec<&'static str>,
    cache: Arc<dyn DependentCache<V>>,
}

/// Clears the write flag when the write ends, including on cancellation
struct WriteGuard<'a, V> {
    flag: &'a AtomicBool,
    state: &'a watch::Sender<SyncSnapshot<V>>,
}

impl<'a, V> WriteGuard<'a, V> {
    fn acquire(flag: &'a AtomicBool, state: &'a watch::Sender<SyncSnapshot<V>>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        state.send_modify(|s| s.writing = true);
        Some(Self { flag, state })
    }
}

impl<V> Drop for WriteGuard<'_, V> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        self.state.send_if_modified(|s| std::mem::replace(&mut s.writing, false));
    }
}

/// Keeps one resource in sync across memory, cache store and backend
pub struct Synchronizer<R: Resource> {
    resource: R,
    store: Arc<dyn CacheStore>,
    state: watch::Sender<SyncSnapshot<R::Value>>,
    writing: AtomicBool,
    refreshing: AtomicBool,
    epoch: AtomicU64,
    persist_lock: Mutex<()>,
    dependents: parking_lot::RwLock<Vec<Dependent<R::Value>>>,
}

impl<R: Resource> Synchronizer<R> {
    /// Create a synchronizer for a resource
    pub fn new(resource: R, store: Arc<dyn CacheStore>) -> Self {
        let (state, _) = watch::channel(SyncSnapshot::empty());
        Self {
            resource,
            store,
            state,
            writing: AtomicBool::new(false),
            refreshing: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            persist_lock: Mutex::new(()),
            dependents: parking_lot::RwLock::new(Vec::new()),
        }
    }

    /// The managed resource
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Current snapshot
    pub fn snapshot(&self) -> SyncSnapshot<R::Value> {
        self.state.borrow().clone()
    }

    /// Current in-memory value
    pub fn value(&self) -> Option<R::Value> {
        self.state.borrow().value.clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot<R::Value>> {
        self.state.subscribe()
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Whether a write is in flight
    pub fn is_writing(&self) -> bool {
        self.writing.load(Ordering::SeqCst)
    }

    /// Register a cache to invalidate after writes touching any of `fields`
    pub fn add_dependent(&self, fields: &[&'static str], cache: Arc<dyn DependentCache<R::Value>>) {
        tracing::debug!(resource = self.resource.name(), dependent = cache.name(), "registered dependent cache");
        self.dependents.write().push(Dependent {
            fields: fields.to_vec(),
            cache,
        });
    }

    /// Value from memory, or from the cache store if memory is empty
    ///
    /// Never touches the network.
    pub async fn cached(&self) -> Option<R::Value> {
        if let Some(value) = self.value() {
            return Some(value);
        }

        let epoch = self.epoch();
        let key = self.resource.cache_key();
        let cached: R::Value = read_json(self.store.as_ref(), &key).await?;

        let mut hydrated = false;
        self.state.send_if_modified(|s| {
            if s.value.is_some() || self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            s.value = Some(cached.clone());
            s.status = SyncStatus::Cached;
            hydrated = true;
            true
        });

        if hydrated {
            tracing::debug!(resource = self.resource.name(), "hydrated from cache");
            Some(cached)
        } else {
            self.value()
        }
    }

    /// Return the cached value and refresh from the backend in the background
    pub async fn load(self: &Arc<Self>) -> Option<R::Value> {
        let value = self.cached().await;
        self.spawn_refresh();
        value
    }

    /// Start a background refresh unless one is already running
    ///
    /// Returns whether a refresh was started. Must be called from within a
    /// tokio runtime.
    pub fn spawn_refresh(self: &Arc<Self>) -> bool {
        let Some(epoch) = self.begin_refresh() else {
            return false;
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_refresh(epoch).await;
        });
        true
    }

    /// Refresh from the backend and wait for the result
    pub async fn refresh(&self) -> RefreshOutcome {
        match self.begin_refresh() {
            Some(epoch) => self.run_refresh(epoch).await,
            None => RefreshOutcome::Skipped,
        }
    }

    /// Claim the refresh slot, returning the epoch the refresh belongs to
    fn begin_refresh(&self) -> Option<u64> {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(resource = self.resource.name(), "refresh already in flight");
            return None;
        }
        self.state.send_modify(|s| s.refreshing = true);
        Some(self.epoch())
    }

    async fn run_refresh(&self, epoch: u64) -> RefreshOutcome {
        let name = self.resource.name();

        let outcome = match self.resource.fetch().await {
            Ok(value) => {
                let mut applied = false;
                self.state.send_if_modified(|s| {
                    if self.epoch.load(Ordering::SeqCst) != epoch {
                        return false;
                    }
                    s.value = Some(value);
                    s.status = SyncStatus::Fresh;
                    s.last_error = None;
                    s.updated_at = Some(Utc::now());
                    applied = true;
                    true
                });

                if applied {
                    self.persist_current().await;
                    RefreshOutcome::Applied
                } else {
                    tracing::debug!(resource = name, "discarding refresh from an older epoch");
                    RefreshOutcome::Discarded
                }
            }
            Err(e) => {
                tracing::warn!(resource = name, "refresh failed, keeping previous value: {}", e);
                self.state.send_if_modified(|s| {
                    if self.epoch.load(Ordering::SeqCst) != epoch {
                        return false;
                    }
                    if s.value.is_some() {
                        s.status = SyncStatus::Stale;
                    }
                    s.last_error = Some(e.clone());
                    true
                });
                RefreshOutcome::Failed(e)
            }
        };

        self.refreshing.store(false, Ordering::SeqCst);
        self.state.send_modify(|s| s.refreshing = false);
        outcome
    }

    /// Write a mutation through the backend
    ///
    /// The mutation is applied to the in-memory value, hydrating it from the
    /// cache store first if needed. Returns `Ok(None)` if another write is
    /// already in flight. On failure
    /// the previous state is left untouched and the error is returned.
    pub async fn update(&self, mutation: R::Mutation) -> Result<Option<R::Value>> {
        let name = self.resource.name();
        let Some(_guard) = WriteGuard::acquire(&self.writing, &self.state) else {
            tracing::debug!(resource = name, "write already in flight, skipping");
            return Ok(None);
        };

        let start_epoch = self.epoch();
        let fields = self.resource.touched_fields(&mutation);
        // A cold synchronizer merges into the persisted value, not a default.
        let current = self.cached().await;

        let value = match self.resource.apply(current, &mutation).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(resource = name, "write failed: {}", e);
                return Err(e.into());
            }
        };

        let mut applied = false;
        self.state.send_if_modified(|s| {
            if self.epoch.load(Ordering::SeqCst) != start_epoch {
                return false;
            }
            self.epoch.fetch_add(1, Ordering::SeqCst);
            s.value = Some(value.clone());
            s.status = SyncStatus::Fresh;
            s.last_error = None;
            s.updated_at = Some(Utc::now());
            applied = true;
            true
        });

        if !applied {
            tracing::info!(resource = name, "state was reset during write, not applying result");
            return Ok(Some(value));
        }

        self.persist_current().await;
        self.invalidate_dependents(&fields, &value).await;

        Ok(Some(value))
    }

    async fn invalidate_dependents(&self, fields: &[&'static str], value: &R::Value) {
        let matching: Vec<Arc<dyn DependentCache<R::Value>>> = self
            .dependents
            .read()
            .iter()
            .filter(|d| d.fields.iter().any(|f| fields.contains(f)))
            .map(|d| Arc::clone(&d.cache))
            .collect();

        for cache in matching {
            if let Err(e) = cache.invalidate(value).await {
                tracing::warn!(
                    resource = self.resource.name(),
                    dependent = cache.name(),
                    "dependent invalidation failed: {}",
                    e
                );
            }
        }
    }

    /// Write the current in-memory value to the cache store
    ///
    /// Serialized so the last persist always writes the latest value.
    async fn persist_current(&self) {
        let _guard = self.persist_lock.lock().await;
        let Some(value) = self.value() else {
            return;
        };
        write_json(self.store.as_ref(), &self.resource.cache_key(), &value).await;
    }

    /// Drop the in-memory value and invalidate in-flight background work
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.value = None;
            s.status = SyncStatus::Idle;
            s.last_error = None;
            s.updated_at = None;
        });
        tracing::debug!(resource = self.resource.name(), "reset");
    }

    /// Reset and remove the persisted value
    pub async fn purge(&self) {
        self.reset();
        let _guard = self.persist_lock.lock().await;
        remove_quietly(self.store.as_ref(), &self.resource.cache_key()).await;
    }
}
