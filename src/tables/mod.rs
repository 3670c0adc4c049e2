//! # Reference Tables
//!
//! Concrete DAOs over the generic caching layer, one module per reference
//! table: the row type, its row-provider trait (the DB query collaborator),
//! the cache feeds, the process-wide singletons, and the typed convenience
//! entry points request code calls.

pub mod rule_item;
pub mod tax_rules;
