//! # DAO Registry and Singleton Lifecycle
//!
//! Each DAO type lives as a process-wide singleton: registered under a name
//! at startup, initialized exactly once on first access, then shared by every
//! request thread. `DaoHelper` provides the race-free lazy initialization
//! (warm-up and the first request may overlap), and `DaoRegistry` is the
//! process-wide name→DAO table that invalidation notifications and
//! administrative sweeps are routed through.

use crate::dao::data_access_object::CacheControl;
use crate::dao::ObjectKey;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Lifecycle of a DAO type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaoState {
    /// Known by name; the singleton has not been built yet.
    Registered,
    /// Singleton built; `instance` is a lock-free cell read from here on.
    Initialized,
}

/// One-time singleton holder for a DAO type.
///
/// Declared as a `static` per DAO. Concurrent first accesses coalesce onto a
/// single initializer run; losers block until the winner finishes.
pub struct DaoHelper<T> {
    name: &'static str,
    cell: OnceLock<Arc<T>>,
}

impl<T: Send + Sync + 'static> DaoHelper<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> DaoState {
        if self.cell.get().is_some() {
            DaoState::Initialized
        } else {
            DaoState::Registered
        }
    }

    /// The singleton, built by `init` on first access.
    ///
    /// `init` runs at most once per process even when warm-up and request
    /// threads race here; every caller gets the same instance.
    pub fn instance(&self, init: impl FnOnce() -> Arc<T>) -> Arc<T> {
        let mut first = false;
        let instance = self.cell.get_or_init(|| {
            first = true;
            init()
        });
        if first {
            info!(dao = self.name, "initialized");
        }
        Arc::clone(instance)
    }

    /// The singleton if already initialized; `None` before warm-up.
    pub fn try_instance(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }
}

/// Process-wide table of initialized DAOs, keyed by entity name.
pub struct DaoRegistry {
    entries: DashMap<&'static str, Arc<dyn CacheControl>>,
}

impl DaoRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static DaoRegistry {
        static REGISTRY: OnceLock<DaoRegistry> = OnceLock::new();
        REGISTRY.get_or_init(DaoRegistry::new)
    }

    /// A private registry; tests use this to avoid cross-test state.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Make a DAO reachable by its entity name. Re-registration replaces the
    /// previous entry.
    pub fn register(&self, dao: Arc<dyn CacheControl>) {
        let name = dao.name();
        debug!(dao = name, cache_class = dao.cache_class(), "registered");
        self.entries.insert(name, dao);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CacheControl>> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }

    /// Route a change notification to the DAO named by its entity.
    ///
    /// Unknown entities are logged and ignored — the notification bus also
    /// carries entities this process does not cache. Returns the number of
    /// cache entries removed.
    pub fn notify(&self, object_key: &ObjectKey) -> Result<usize> {
        match self.get(object_key.entity()) {
            Some(dao) => dao.invalidate(object_key),
            None => {
                warn!(entity = object_key.entity(), "notification for unregistered entity");
                Ok(0)
            }
        }
    }

    /// Drop every resident entry in every registered DAO, returning the
    /// total entry count removed.
    pub fn clear_all(&self) -> usize {
        self.entries.iter().map(|entry| entry.clear()).sum()
    }
}

impl Default for DaoRegistry {
    fn default() -> Self {
        Self::new()
    }
}
