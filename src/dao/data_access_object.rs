//! # Data Access Object
//!
//! Cache-aside wrapper around one DB-backed reference table. A concrete table
//! implements [`CacheFeed`] — row fetching, key translation, and cache-class
//! identity — and the generic `DataAccessObject` supplies the caching,
//! request-scoped sharing, invalidation routing, and diagnostics every table
//! needs.
//!
//! The cached value for a key is the full container of rows one DB round trip
//! produced, held as `Vec<Arc<Row>>` so request-scoped subsets can share rows
//! without copying them. The shared container is never mutated after load.

use crate::cache::{CacheHandle, GenericCache};
use crate::dao::{DeleteList, ObjectKey};
use crate::error::Result;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

/// Bounds every composite business key satisfies.
pub trait CacheKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// What a concrete reference table supplies to its DAO.
pub trait CacheFeed: Send + Sync + 'static {
    type Key: CacheKey;
    type Row: Send + Sync + 'static;

    /// Registry identity; also the entity name invalidation notifications use.
    fn name(&self) -> &'static str;

    /// Logical partition controlling DB pool routing and cache-region
    /// configuration.
    fn cache_class(&self) -> &'static str;

    /// One DB round trip producing every row for `key`.
    ///
    /// Errors propagate unmodified; no retry is attempted here.
    fn fetch(&self, key: &Self::Key) -> Result<Vec<Self::Row>>;

    /// Notification named fields to typed key.
    fn translate_key(&self, object_key: &ObjectKey) -> Result<Self::Key>;

    /// Typed key to notification named fields.
    fn object_key(&self, key: &Self::Key) -> ObjectKey;

    /// Optional eager bulk source drained once by [`DataAccessObject::warm_up`].
    fn preload(&self) -> Result<Vec<(Self::Key, Vec<Self::Row>)>> {
        Ok(Vec::new())
    }
}

/// Object-safe cache management surface, used by the process-wide registry to
/// route invalidations and administrative sweeps without knowing key types.
pub trait CacheControl: Send + Sync {
    fn name(&self) -> &'static str;
    fn cache_class(&self) -> &'static str;
    fn invalidate(&self, object_key: &ObjectKey) -> Result<usize>;
    fn clear(&self) -> usize;
    fn resident_entries(&self) -> usize;
}

/// Cache-aside access to one non-temporal reference table.
pub struct DataAccessObject<F: CacheFeed> {
    feed: F,
    cache: GenericCache<F::Key, Vec<CacheHandle<F::Row>>>,
    get_calls: AtomicU64,
}

impl<F: CacheFeed> DataAccessObject<F> {
    pub fn new(feed: F) -> Self {
        let cache = GenericCache::new(feed.name());
        Self {
            feed,
            cache,
            get_calls: AtomicU64::new(0),
        }
    }

    /// Bound the cache region to `capacity` resident entries.
    pub fn with_capacity(feed: F, capacity: usize) -> Self {
        let cache = GenericCache::with_capacity(feed.name(), capacity);
        Self {
            feed,
            cache,
            get_calls: AtomicU64::new(0),
        }
    }

    /// Region sized per the feed's cache-class configuration.
    pub fn from_config(feed: F, config: &crate::config::FaredataConfig) -> Self {
        let class = config.class_config(feed.cache_class());
        if class.capacity > 0 {
            Self::with_capacity(feed, class.capacity)
        } else {
            Self::new(feed)
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Full cached container for `key`, loaded on miss, retained for the
    /// request through `del`.
    pub fn get<'a>(
        &self,
        del: &'a DeleteList,
        key: &F::Key,
    ) -> Result<&'a [CacheHandle<F::Row>]> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        let handle = self.cache.get_or_create(key, |k| self.load_rows(k))?;
        Ok(del.copy(handle).as_slice())
    }

    /// Subset of the cached container matching `pred`, adopted into `del`.
    ///
    /// Applies non-key predicates the key cannot express; the shared cached
    /// container itself is left untouched.
    pub fn get_filtered<'a, P>(
        &self,
        del: &'a DeleteList,
        key: &F::Key,
        pred: P,
    ) -> Result<&'a [CacheHandle<F::Row>]>
    where
        P: Fn(&F::Row) -> bool,
    {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        let handle = self.cache.get_or_create(key, |k| self.load_rows(k))?;
        let subset: Vec<CacheHandle<F::Row>> = handle
            .iter()
            .filter(|row| pred(row))
            .cloned()
            .collect();
        Ok(del.adopt(subset).as_slice())
    }

    /// Resident container without triggering a load; `None` means not yet
    /// loaded, a valid cheap answer for feature-gated tables.
    pub fn get_if_resident<'a>(
        &self,
        del: &'a DeleteList,
        key: &F::Key,
    ) -> Option<&'a [CacheHandle<F::Row>]> {
        let handle = self.cache.get_if_resident(key)?;
        Some(del.copy(handle).as_slice())
    }

    /// Explicit insert used by eager startup loaders.
    pub fn put(&self, key: F::Key, rows: Vec<F::Row>) {
        self.cache
            .put(key, rows.into_iter().map(CacheHandle::new).collect());
    }

    /// Drain the feed's preload source into the cache, returning the number
    /// of keys populated.
    pub fn warm_up(&self) -> Result<usize> {
        let entries = self.feed.preload()?;
        let count = entries.len();
        for (key, rows) in entries {
            self.put(key, rows);
        }
        if count > 0 {
            info!(dao = self.feed.name(), keys = count, "eager load complete");
        }
        Ok(count)
    }

    /// DB round trips executed so far; one per distinct missed key.
    pub fn load_count(&self) -> u64 {
        self.cache.load_count()
    }

    /// Typed gets served so far.
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::Relaxed)
    }

    fn load_rows(&self, key: &F::Key) -> Result<Vec<CacheHandle<F::Row>>> {
        match self.feed.fetch(key) {
            Ok(rows) => Ok(rows.into_iter().map(CacheHandle::new).collect()),
            Err(err) => {
                warn!(dao = self.feed.name(), %err, "DB exception during cache load");
                Err(err)
            }
        }
    }
}

impl<F: CacheFeed> CacheControl for DataAccessObject<F> {
    fn name(&self) -> &'static str {
        self.feed.name()
    }

    fn cache_class(&self) -> &'static str {
        self.feed.cache_class()
    }

    fn invalidate(&self, object_key: &ObjectKey) -> Result<usize> {
        let key = self.feed.translate_key(object_key).inspect_err(|err| {
            error!(dao = self.feed.name(), %object_key, %err, "translate failed");
        })?;
        if self.cache.invalidate(&key) {
            info!(dao = self.feed.name(), ?key, "cache entry removed");
            Ok(1)
        } else {
            warn!(
                dao = self.feed.name(),
                ?key,
                "invalidate matched nothing (likely empty cache after server startup)"
            );
            Ok(0)
        }
    }

    fn clear(&self) -> usize {
        let count = self.cache.clear();
        info!(dao = self.feed.name(), entries = count, "cache cleared");
        count
    }

    fn resident_entries(&self) -> usize {
        self.cache.len()
    }
}
