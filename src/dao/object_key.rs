//! # Named-Field Key Representation
//!
//! Cache-invalidation notifications arrive as named fields rather than typed
//! keys. `ObjectKey` is the bridge: each DAO translates between its typed key
//! and this representation so a notification can be routed to the right cache
//! entry, and so a typed key can be published back to the notification bus.

use crate::error::{FaredataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A key expressed as an entity name plus named string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectKey {
    entity: String,
    fields: BTreeMap<String, String>,
}

impl ObjectKey {
    /// New key for the named entity (the DAO/table name notifications use).
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl ToString) {
        self.fields.insert(name.into(), value.to_string());
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value, or a translation error naming the missing field.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.value(name).ok_or_else(|| {
            FaredataError::key_translation(&self.entity, format!("missing field {name}"))
        })
    }

    /// Parsed field value, or a translation error naming the bad field.
    pub fn parsed<T: FromStr>(&self, name: &str) -> Result<T> {
        self.required(name)?.parse().map_err(|_| {
            FaredataError::key_translation(&self.entity, format!("unparseable field {name}"))
        })
    }

    pub fn set_date_value(&mut self, name: impl Into<String>, date: NaiveDate) {
        self.set_value(name, date.format(DATE_FORMAT));
    }

    /// Date field in `%Y-%m-%d` form, when present and well-formed.
    pub fn date_value(&self, name: &str) -> Option<NaiveDate> {
        self.value(name)
            .and_then(|raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Notification-bus payload form.
    pub fn to_json(&self) -> std::result::Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse a notification-bus payload.
    pub fn from_json(json: serde_json::Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.entity)?;
        for (name, value) in &self.fields {
            write!(f, "|{name}={value}")?;
        }
        Ok(())
    }
}
