//! # Data Access Objects
//!
//! Cache-aside wrappers over DB-backed reference tables, the request-scoped
//! pointer arena they share rows through, and the process-wide registry that
//! owns their singletons and routes invalidation notifications.
//!
//! A request thread asks a typed DAO for rows given business parameters and a
//! ticketing date. The DAO builds an immutable key — historical tables fold
//! the ticketing date into a date bucket — loads the row container through
//! the table's row provider on a cache miss, filters by effectivity windows
//! and non-key predicates, and parks everything it hands out in the request's
//! [`DeleteList`].

pub mod data_access_object;
pub mod date_bucket;
pub mod delete_list;
pub mod effective;
pub mod historical;
pub mod object_key;
pub mod registry;

pub use data_access_object::{CacheControl, CacheFeed, CacheKey, DataAccessObject};
pub use date_bucket::{BucketGranularity, DateRange};
pub use delete_list::DeleteList;
pub use effective::{CreateExpireDated, EffectiveDated};
pub use historical::{HistoricalCacheFeed, HistoricalDataAccessObject, HistoricalKey};
pub use object_key::ObjectKey;
pub use registry::{DaoHelper, DaoRegistry, DaoState};
