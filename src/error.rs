//! # Structured Error Handling
//!
//! Crate-wide error types using thiserror for structured variants instead of
//! `Box<dyn Error>` patterns. Errors are `Clone` so a single failed cache
//! load can propagate to every request thread coalesced onto that load.

use crate::remote::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the caching and data-access layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaredataError {
    #[error("database error in {table}: {message}")]
    Database { table: String, message: String },

    #[error("key translation failed for {entity}: {message}")]
    KeyTranslation { entity: String, message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("data access object {name} is not initialized")]
    NotInitialized { name: String },

    #[error("no data access object registered under {name}")]
    UnknownDao { name: String },

    #[error("remote cache protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl FaredataError {
    /// Create a database error for a named table.
    pub fn database(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a key translation error for a named entity.
    pub fn key_translation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::KeyTranslation {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not-initialized error for a named DAO.
    pub fn not_initialized(name: impl Into<String>) -> Self {
        Self::NotInitialized { name: name.into() }
    }
}

/// Result type alias for data-access operations.
pub type Result<T> = std::result::Result<T, FaredataError>;
