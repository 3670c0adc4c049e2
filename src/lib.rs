#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Faredata Core
//!
//! High-performance Rust core for airline fare reference data: a generic
//! temporal caching layer between pricing request threads and the reference
//! database, plus the binary protocol that keeps those caches coherent
//! across server processes.
//!
//! ## Overview
//!
//! Fare pricing reads hundreds of slowly-changing reference tables — rule
//! items, tax records, carrier preferences — far too often to query per
//! request. Each table sits behind a data access object that loads rows once
//! per composite business key and serves every subsequent request from
//! memory. Historical pricing ("as of" a past ticketing date) buckets keys
//! by date range so reprices across a spread of dates share DB round trips.
//!
//! ## Architecture
//!
//! - [`cache`] - Concurrent key→value store with per-key load coalescing
//! - [`dao`] - Data access objects, the request-scoped DeleteList arena,
//!   date bucketing, effectivity windows, and the process-wide registry
//! - [`tables`] - Concrete reference tables built on the generic layer
//! - [`remote`] - Remote cache header codec and status taxonomy
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - One-time tracing initialization
//!
//! ## Key Properties
//!
//! - **Stampede prevention**: concurrent misses for one key run exactly one
//!   DB load; every waiter shares the result, including failures
//! - **Stable handles**: eviction and replacement never invalidate a handle
//!   already issued to a request thread
//! - **Request-scoped lifetimes**: everything a DAO hands out borrows from
//!   the request's [`dao::DeleteList`], so retaining data past the request
//!   is a compile error
//! - **Deterministic bucketing**: a ticketing date maps to exactly one date
//!   bucket per granularity
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use faredata_core::dao::DeleteList;
//! use faredata_core::tables::rule_item::{self, RuleItemQuery};
//! use std::sync::Arc;
//!
//! # fn example(query: Arc<dyn RuleItemQuery>) -> faredata_core::Result<()> {
//! // Warm-up: build the singletons once.
//! let _dao = rule_item::rule_item_dao(&query);
//!
//! // Per request: one DeleteList owns everything handed out.
//! let del = DeleteList::new();
//! let ticket_date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! if let Some(item) = rule_item::get_rule_item(&del, "ATP", 5, ticket_date, false)? {
//!     println!("rule item {} effective {}", item.item_no, item.eff_date);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dao;
pub mod error;
pub mod logging;
pub mod remote;
pub mod tables;

pub use cache::{CacheHandle, GenericCache};
pub use config::{CacheClassConfig, FaredataConfig, RemoteCacheConfig};
pub use dao::{
    BucketGranularity, CacheControl, CacheFeed, CacheKey, CreateExpireDated, DataAccessObject,
    DaoHelper, DaoRegistry, DaoState, DateRange, DeleteList, EffectiveDated, HistoricalCacheFeed,
    HistoricalDataAccessObject, HistoricalKey, ObjectKey,
};
pub use error::{FaredataError, Result};
pub use remote::{ProtocolError, RcStatus, RemoteCacheHeader};
