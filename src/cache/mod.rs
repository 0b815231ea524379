//! Admin-scoped, time-bounded read cache.
//!
//! [`ScopedReadCache`] sits in front of a remote document store and remembers
//! two kinds of reads:
//!
//! | Kind       | Key                  | Holds                          |
//! |------------|----------------------|--------------------------------|
//! | Collection | `name`               | every record, in fetch order   |
//! | Record     | `(collection, id)`   | one record                     |
//!
//! Every entry is tied to the active *scope*, the identifier of the admin
//! currently signed in. An entry is served only while a scope is set and the
//! entry is younger than the TTL. Switching scope (or clearing it) drops
//! everything, so one admin never sees reads cached for another.
//!
//! Fetches are supplied by the caller as closures and run without holding the
//! internal lock. Concurrent misses on the same key each run their own fetch;
//! the last one to finish wins. A fetch that was started before the scope
//! changed or an invalidation ran still returns its data to its caller but is
//! not written back.
//!
//! # Examples
//!
//! ```
//! use std::convert::Infallible;
//! use hrstore::cache::ScopedReadCache;
//! use hrstore::config::CacheConfig;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cache: ScopedReadCache<String> = ScopedReadCache::from_config(&CacheConfig::default());
//! cache.set_scope("9876543210");
//!
//! let names = cache
//!     .get_collection("employees", || async {
//!         Ok::<_, Infallible>(vec!["Asha".to_owned(), "Ravi".to_owned()])
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(names.len(), 2);
//! assert_eq!(cache.stats().misses, 1);
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

/// A cached value and the instant its fetch completed.
#[derive(Debug, Clone)]
struct Stamped<T> {
    value: T,
    fetched_at: Instant,
}

impl<T> Stamped<T> {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Counters describing cache activity since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from the cache.
    pub hits: u64,
    /// Reads that had to run their fetch.
    pub misses: u64,
    /// Explicit invalidations, scope changes included.
    pub invalidations: u64,
    /// Completed fetches whose result was not stored because the scope
    /// changed or an invalidation ran while they were in flight.
    pub discarded: u64,
    /// Collection snapshots currently held.
    pub collections: usize,
    /// Record entries currently held.
    pub records: usize,
}

struct State<V> {
    // Empty means no admin is signed in.
    scope: String,
    // Bumped on every clear or invalidation; fetches started under an older
    // generation are not written back.
    generation: u64,
    collections: HashMap<String, Stamped<Vec<V>>>,
    records: HashMap<String, HashMap<String, Stamped<V>>>,
    stats: CacheStats,
}

impl<V> State<V> {
    fn new() -> Self {
        Self {
            scope: String::new(),
            generation: 0,
            collections: HashMap::new(),
            records: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    fn has_scope(&self) -> bool {
        !self.scope.is_empty()
    }

    fn clear(&mut self) {
        self.collections.clear();
        self.records.clear();
        self.generation += 1;
    }
}

/// An in-process read cache scoped to one admin at a time.
///
/// Construct one per application and share it behind an [`Arc`]. Values are
/// cloned out on every hit, so `V` is usually a cheap-to-clone record type.
pub struct ScopedReadCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<State<V>>,
}

impl<V: Clone> ScopedReadCache<V> {
    /// Creates an empty, unscoped cache.
    ///
    /// # Arguments
    ///
    /// - `ttl` — how long an entry stays valid after its fetch completes.
    /// - `clock` — time source used for every freshness check.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            state: Mutex::new(State::new()),
        }
    }

    /// Creates a cache from `config` using the system clock.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), Arc::new(SystemClock))
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the active scope, or `None` when no admin is signed in.
    pub fn scope(&self) -> Option<String> {
        let state = self.lock();
        state.has_scope().then(|| state.scope.clone())
    }

    /// Makes `scope` the active principal.
    ///
    /// A different scope drops every cached entry before it is recorded. An
    /// empty scope always drops everything and leaves the cache unscoped.
    /// Setting the scope that is already active is a no-op.
    pub fn set_scope(&self, scope: &str) {
        let mut state = self.lock();

        if scope.is_empty() {
            if state.has_scope() {
                info!(previous = %state.scope, "cache scope cleared");
            }
            state.clear();
            state.scope.clear();
            state.stats.invalidations += 1;
            return;
        }

        if state.scope != scope {
            info!(previous = %state.scope, scope, "cache scope changed, dropping cached reads");
            state.clear();
            state.scope = scope.to_owned();
            state.stats.invalidations += 1;
        }
    }

    /// Returns every record of collection `name`.
    ///
    /// A fresh snapshot is returned as-is and `fetch` is not called. Otherwise
    /// `fetch` runs and, if it succeeds, its result becomes the new snapshot.
    ///
    /// # Errors
    ///
    /// Whatever `fetch` returns. Nothing is cached on failure.
    pub async fn get_collection<F, Fut, E>(&self, name: &str, fetch: F) -> Result<Vec<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<V>, E>>,
    {
        let generation = {
            let mut state = self.lock();
            let now = self.clock.now();
            let cached = state
                .collections
                .get(name)
                .filter(|entry| state.has_scope() && entry.is_fresh(now, self.ttl))
                .map(|entry| entry.value.clone());

            if let Some(records) = cached {
                state.stats.hits += 1;
                debug!(collection = name, count = records.len(), "collection served from cache");
                return Ok(records);
            }
            state.stats.misses += 1;
            state.generation
        };

        debug!(collection = name, "fetching collection");
        let records = fetch().await?;

        let mut state = self.lock();
        if !state.has_scope() {
            return Ok(records);
        }
        if state.generation != generation {
            state.stats.discarded += 1;
            warn!(collection = name, "cache changed during fetch, result not stored");
            return Ok(records);
        }
        let fetched_at = self.clock.now();
        state.collections.insert(
            name.to_owned(),
            Stamped {
                value: records.clone(),
                fetched_at,
            },
        );
        Ok(records)
    }

    /// Returns record `id` of `collection`.
    ///
    /// Same read-through behavior as [`get_collection`](Self::get_collection)
    /// for a single entry. Whether the record exists is decided by `fetch`;
    /// its "not found" error reaches the caller unchanged.
    ///
    /// # Errors
    ///
    /// Whatever `fetch` returns. Nothing is cached on failure.
    pub async fn get_record<F, Fut, E>(&self, collection: &str, id: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let generation = {
            let mut state = self.lock();
            let now = self.clock.now();
            let cached = state
                .records
                .get(collection)
                .and_then(|entries| entries.get(id))
                .filter(|entry| state.has_scope() && entry.is_fresh(now, self.ttl))
                .map(|entry| entry.value.clone());

            if let Some(record) = cached {
                state.stats.hits += 1;
                debug!(collection, id, "record served from cache");
                return Ok(record);
            }
            state.stats.misses += 1;
            state.generation
        };

        debug!(collection, id, "fetching record");
        let record = fetch().await?;

        let mut state = self.lock();
        if !state.has_scope() {
            return Ok(record);
        }
        if state.generation != generation {
            state.stats.discarded += 1;
            warn!(collection, id, "cache changed during fetch, result not stored");
            return Ok(record);
        }
        let fetched_at = self.clock.now();
        state.records.entry(collection.to_owned()).or_default().insert(
            id.to_owned(),
            Stamped {
                value: record.clone(),
                fetched_at,
            },
        );
        Ok(record)
    }

    /// Drops the snapshot of collection `name`. Record entries are kept.
    pub fn invalidate_collection(&self, name: &str) {
        let mut state = self.lock();
        state.collections.remove(name);
        state.generation += 1;
        state.stats.invalidations += 1;
        debug!(collection = name, "collection invalidated");
    }

    /// Drops the entry for record `id` of `collection`.
    pub fn invalidate_record(&self, collection: &str, id: &str) {
        let mut state = self.lock();
        if let Some(entries) = state.records.get_mut(collection) {
            entries.remove(id);
            if entries.is_empty() {
                state.records.remove(collection);
            }
        }
        state.generation += 1;
        state.stats.invalidations += 1;
        debug!(collection, id, "record invalidated");
    }

    /// Drops every cached entry but keeps the active scope.
    pub fn invalidate_all(&self) {
        let mut state = self.lock();
        state.clear();
        state.stats.invalidations += 1;
        debug!("all cached reads invalidated");
    }

    /// Returns a snapshot of the activity counters and current entry counts.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            collections: state.collections.len(),
            records: state.records.values().map(HashMap::len).sum(),
            ..state.stats
        }
    }

    // The maps only ever hold complete entries, so a poisoned lock is still
    // consistent.
    fn lock(&self) -> MutexGuard<'_, State<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
