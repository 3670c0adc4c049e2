//! # Generic Cache
//!
//! Concurrent key→value store with create-on-miss semantics. Each key maps to
//! a once-initialized slot: racing readers of a missing key coalesce onto a
//! single load, so a reference table is fetched from the database exactly once
//! no matter how many request threads ask for it simultaneously. Values are
//! handed out as `Arc` handles, so eviction and replacement only detach the
//! map entry — readers already holding a handle keep a live value.

use crate::error::Result;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Shared handle to a cached value.
///
/// Handles stay valid across invalidation, replacement, and eviction of the
/// underlying entry; the value is released when the last handle drops.
pub type CacheHandle<V> = Arc<V>;

type Slot<V> = Arc<OnceLock<Result<CacheHandle<V>>>>;

/// Concurrent cache with per-key load coalescing.
///
/// `K` is an immutable composite business key; `V` is typically a container
/// of rows loaded in one DB round trip.
pub struct GenericCache<K, V> {
    name: String,
    capacity: Option<usize>,
    entries: DashMap<K, Slot<V>>,
    loads: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> GenericCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create an unbounded cache region.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: None,
            entries: DashMap::new(),
            loads: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a capacity-bounded region. Inserting past the bound evicts
    /// arbitrary other entries; handles already issued stay valid.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(name)
        }
    }

    /// Region name, for logging and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resident entry, loading through `create` on a miss.
    ///
    /// Concurrent misses for one key run `create` exactly once; the other
    /// callers block until that load settles. A failed load is propagated to
    /// every coalesced waiter, then the poisoned slot is dropped so a later
    /// call can retry.
    pub fn get_or_create<F>(&self, key: &K, create: F) -> Result<CacheHandle<V>>
    where
        F: FnOnce(&K) -> Result<V>,
    {
        let slot: Slot<V> = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .value()
            .clone();

        let outcome = slot.get_or_init(|| {
            self.loads.fetch_add(1, Ordering::Relaxed);
            debug!(region = %self.name, "cache miss, loading");
            create(key).map(Arc::new)
        });

        match outcome {
            Ok(handle) => {
                let handle = handle.clone();
                self.enforce_capacity(key);
                Ok(handle)
            }
            Err(err) => {
                let err = err.clone();
                // Drop only the slot this failure belongs to; a concurrent
                // retry may already have installed a fresh one.
                self.entries.remove_if(key, |_, resident| Arc::ptr_eq(resident, &slot));
                Err(err)
            }
        }
    }

    /// Resident entry, never triggering a load.
    pub fn get_if_resident(&self, key: &K) -> Option<CacheHandle<V>> {
        let slot = self.entries.get(key)?.value().clone();
        match slot.get() {
            Some(Ok(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Explicit insert, replacing any resident entry.
    ///
    /// Used by eager startup loaders that populate many keys from a single
    /// scan, bypassing per-key create-on-miss.
    pub fn put(&self, key: K, value: V) {
        let slot: Slot<V> = Arc::new(OnceLock::new());
        let _ = slot.set(Ok(Arc::new(value)));
        self.entries.insert(key.clone(), slot);
        self.enforce_capacity(&key);
    }

    /// Detach one entry. Returns whether anything was resident.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Detach every entry whose key matches `pred`, returning the count.
    pub fn invalidate_where(&self, pred: impl Fn(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pred(key));
        before.saturating_sub(self.entries.len())
    }

    /// Detach everything, returning the number of entries dropped.
    pub fn clear(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of loads executed on behalf of `get_or_create` misses.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Number of entries evicted by the capacity bound.
    pub fn eviction_count(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    fn enforce_capacity(&self, keep: &K) {
        let Some(capacity) = self.capacity else {
            return;
        };
        while self.entries.len() > capacity {
            let victim = self
                .entries
                .iter()
                .map(|entry| entry.key().clone())
                .find(|candidate| candidate != keep);
            match victim {
                Some(key) => {
                    if self.entries.remove(&key).is_some() {
                        self.evictions.fetch_add(1, Ordering::Relaxed);
                        warn!(region = %self.name, "capacity reached, evicting entry");
                    }
                }
                None => break,
            }
        }
    }
}
