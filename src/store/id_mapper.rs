//! Translation between the generic `id` field and the store-native key.
//!
//! Only the top-level field is renamed. Nested attributes that happen to be
//! called `id` (e.g. `profile.id`) are data and pass through unchanged.

use crate::core::entity::ID_FIELD;
use crate::core::{Entity, EntityError, Record, Result};
use crate::query::{Filter, Patch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMapper {
    native_field: String,
}

impl IdMapper {
    pub fn new(native_field: impl Into<String>) -> Self {
        Self {
            native_field: native_field.into(),
        }
    }

    pub fn native_field(&self) -> &str {
        &self.native_field
    }

    /// Rewrites every clause on `id` to the native key, at any depth of the
    /// combinator tree.
    pub fn outbound_filter(&self, filter: &Filter) -> Filter {
        filter.rename_field(ID_FIELD, &self.native_field)
    }

    pub fn outbound_patch(&self, patch: &Patch) -> Patch {
        patch.rename_field(ID_FIELD, &self.native_field)
    }

    /// Stores a generic `id`, if present, under the native key.
    pub fn outbound_record(&self, record: Record) -> Record {
        rename_key(record, ID_FIELD, &self.native_field)
    }

    pub fn inbound_record(&self, record: Record) -> Record {
        rename_key(record, &self.native_field, ID_FIELD)
    }

    pub fn inbound(&self, entity_type: &str, record: Record) -> Result<Entity> {
        Entity::from_record(self.inbound_record(record))
            .map_err(|_| EntityError::MissingId(entity_type.to_string()))
    }

    /// Point lookup on the native key; already store-native, no mapping pass.
    pub fn key_filter(&self, id: &str) -> Filter {
        Filter::eq(self.native_field.as_str(), id)
    }

    pub fn keys_filter<'a, I>(&self, ids: I) -> Filter
    where
        I: IntoIterator<Item = &'a str>,
    {
        Filter::is_in(self.native_field.as_str(), ids)
    }
}

impl Default for IdMapper {
    fn default() -> Self {
        Self::new("_id")
    }
}

fn rename_key(mut record: Record, from: &str, to: &str) -> Record {
    if let Some(value) = record.remove(from) {
        record.insert(to.to_string(), value);
    }
    record
}
