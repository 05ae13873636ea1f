//! Generic entity representation.
//!
//! An [`Entity`] is a JSON object that always carries a string `id` field.
//! Everything else is opaque attribute data.

use super::error::{EntityError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Name of the generic identifier field.
pub const ID_FIELD: &str = "id";

/// A raw JSON object as it crosses the store boundary.
pub type Record = Map<String, JsonValue>;

/// A record that is guaranteed to carry a non-empty string `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Record", into = "Record")]
pub struct Entity {
    record: Record,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        let mut record = Record::new();
        record.insert(ID_FIELD.to_string(), JsonValue::String(id.into()));
        Self { record }
    }

    /// Builder-style attribute setter. The `id` field is immutable and
    /// writes to it are ignored.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let field = field.into();
        if field != ID_FIELD {
            self.record.insert(field, value.into());
        }
        self
    }

    /// Validates that `record` carries a usable id.
    pub fn from_record(record: Record) -> Result<Self> {
        match record.get(ID_FIELD) {
            Some(JsonValue::String(id)) if !id.is_empty() => Ok(Self { record }),
            _ => Err(EntityError::MissingId(describe(&record))),
        }
    }

    /// Parses any JSON value into an entity; it must be an object with an id.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(record) => Self::from_record(record),
            other => Err(EntityError::Serialization(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn id(&self) -> &str {
        self.record
            .get(ID_FIELD)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.record.get(field)
    }

    pub fn as_record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

impl TryFrom<Record> for Entity {
    type Error = EntityError;

    fn try_from(record: Record) -> Result<Self> {
        Self::from_record(record)
    }
}

impl From<Entity> for Record {
    fn from(entity: Entity) -> Self {
        entity.record
    }
}

impl From<Entity> for JsonValue {
    fn from(entity: Entity) -> Self {
        JsonValue::Object(entity.record)
    }
}

fn describe(record: &Record) -> String {
    let keys: Vec<&str> = record.keys().map(String::as_str).collect();
    format!("{{{}}}", keys.join(", "))
}
