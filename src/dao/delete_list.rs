//! # Request-Scoped Pointer Arena
//!
//! Every pricing request owns one `DeleteList`. Values borrowed from a
//! long-lived cache are *copied* into it (the handle is retained so eviction
//! cannot free the value mid-request), and freshly derived values — filtered
//! row subsets, mostly — are *adopted* (the list takes exclusive ownership).
//! Both hand back plain references that borrow from the list, so nothing
//! obtained through it can outlive the request: the list drops at request end
//! on every exit path, releasing each retained handle and each adopted value
//! exactly once.

use crate::cache::CacheHandle;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

/// Per-request ownership arena for cache-borrowed and transient values.
///
/// Owned by exactly one request; never shared between requests.
#[derive(Default)]
pub struct DeleteList {
    retained: Mutex<Vec<Arc<dyn Any + Send + Sync>>>,
    adopted: Mutex<Vec<Arc<dyn Any + Send + Sync>>>,
}

impl DeleteList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend a borrowed cache handle's lifetime to the rest of the request.
    ///
    /// The handle is parked in the list, protecting the value from concurrent
    /// replacement or eviction; the returned reference borrows from the list
    /// and cannot escape the request.
    pub fn copy<V>(&self, handle: CacheHandle<V>) -> &V
    where
        V: Send + Sync + 'static,
    {
        let raw: *const V = Arc::as_ptr(&handle);
        self.retained.lock().push(handle);
        // SAFETY: the Arc just pushed stays in `retained` until `self` drops,
        // entries are never removed before then, and an Arc's pointee never
        // moves; the reference is tied to `&self` so it cannot outlive the
        // list.
        unsafe { &*raw }
    }

    /// Take exclusive ownership of a value not backed by the cache.
    ///
    /// The value is released exactly once, when the list drops. The list
    /// holds the only reference, so ownership is exclusive even though the
    /// storage is shared-pointer shaped.
    pub fn adopt<T>(&self, value: T) -> &T
    where
        T: Send + Sync + 'static,
    {
        let owned = Arc::new(value);
        let raw: *const T = Arc::as_ptr(&owned);
        self.adopted.lock().push(owned);
        // SAFETY: the Arc just pushed stays in `adopted` until `self` drops,
        // entries are never removed before then, and an Arc's pointee never
        // moves; the reference is tied to `&self`.
        unsafe { &*raw }
    }

    /// Number of cache handles retained so far.
    pub fn retained_count(&self) -> usize {
        self.retained.lock().len()
    }

    /// Number of values adopted so far.
    pub fn adopted_count(&self) -> usize {
        self.adopted.lock().len()
    }
}

impl std::fmt::Debug for DeleteList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteList")
            .field("retained", &self.retained_count())
            .field("adopted", &self.adopted_count())
            .finish()
    }
}
