//! # Configuration
//!
//! Deployment-tunable settings for the caching layer: per-cache-class region
//! sizing and DB pool routing, the historical bucket granularity, and the
//! remote cache client parameters. Values come from defaults overlaid with
//! `FAREDATA_*` environment variables.

use crate::dao::BucketGranularity;
use crate::error::{FaredataError, Result};
use std::collections::HashMap;

/// Per-cache-class region settings.
///
/// A cache class is the logical partition a DAO belongs to; it selects both
/// the DB connection pool its loads run against and the cache-region sizing
/// that applies.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheClassConfig {
    /// DB connection pool routing name.
    pub pool: String,
    /// Maximum resident entries; 0 means unbounded.
    pub capacity: usize,
    /// Region flavor tag consumed by deployment tooling.
    pub cache_type: String,
}

impl Default for CacheClassConfig {
    fn default() -> Self {
        Self {
            pool: "Default".to_string(),
            capacity: 0,
            cache_type: "lru".to_string(),
        }
    }
}

/// Remote cache client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCacheConfig {
    pub master_host: String,
    pub master_port: u16,
    pub client_connection_timeout_ms: u64,
    pub max_clients: usize,
    pub queue_limit: usize,
}

impl Default for RemoteCacheConfig {
    fn default() -> Self {
        Self {
            master_host: "localhost".to_string(),
            master_port: 53701,
            client_connection_timeout_ms: 5_000,
            max_clients: 64,
            queue_limit: 1_024,
        }
    }
}

/// Top-level configuration for the caching layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FaredataConfig {
    /// Bucket width historical DAOs cache by.
    pub historical_granularity: BucketGranularity,
    /// Per-cache-class overrides; classes not listed use the default.
    pub cache_classes: HashMap<String, CacheClassConfig>,
    pub remote: RemoteCacheConfig,
}

impl Default for FaredataConfig {
    fn default() -> Self {
        Self {
            historical_granularity: BucketGranularity::Monthly,
            cache_classes: HashMap::new(),
            remote: RemoteCacheConfig::default(),
        }
    }
}

impl FaredataConfig {
    /// Defaults overlaid with `FAREDATA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("FAREDATA_HISTORICAL_GRANULARITY") {
            config.historical_granularity = raw.parse().map_err(|err| {
                FaredataError::configuration(format!("invalid historical granularity: {err}"))
            })?;
        }

        if let Ok(raw) = std::env::var("FAREDATA_REMOTE_MASTER_HOST") {
            config.remote.master_host = raw;
        }

        if let Ok(raw) = std::env::var("FAREDATA_REMOTE_MASTER_PORT") {
            config.remote.master_port = raw.parse().map_err(|err| {
                FaredataError::configuration(format!("invalid remote master port: {err}"))
            })?;
        }

        if let Ok(raw) = std::env::var("FAREDATA_REMOTE_MAX_CLIENTS") {
            config.remote.max_clients = raw.parse().map_err(|err| {
                FaredataError::configuration(format!("invalid remote max clients: {err}"))
            })?;
        }

        Ok(config)
    }

    /// Settings for a cache class, falling back to the default region.
    pub fn class_config(&self, cache_class: &str) -> CacheClassConfig {
        self.cache_classes
            .get(cache_class)
            .cloned()
            .unwrap_or_default()
    }
}
