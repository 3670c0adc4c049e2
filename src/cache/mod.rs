//! # Concurrent Reference-Data Caching
//!
//! The generic key→value store underneath every data access object. Entries
//! are shared out as reference-counted handles, create-on-miss is coalesced
//! per key, and replacement never invalidates a handle already issued.

pub mod generic_cache;

pub use generic_cache::{CacheHandle, GenericCache};
