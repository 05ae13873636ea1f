use crate::core::entity::ID_FIELD;
use crate::core::{EntityError, Result};

/// How `get_by_ids` treats a partial result from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultiGetPolicy {
    /// Fail with `NotFound` if any requested id is absent.
    #[default]
    AllOrNothing,
    /// Fail with `NotFound` only if none of the requested ids exist.
    NonEmpty,
}

/// Store adapter configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Primary-key field used by the store (`_id` for MongoDB-like stores)
    pub native_id_field: String,

    /// Partial-result handling for multi-id lookups
    pub multi_get_policy: MultiGetPolicy,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            native_id_field: "_id".to_string(),
            multi_get_policy: MultiGetPolicy::default(),
        }
    }

    /// Set the store-native key field
    pub fn native_id_field(mut self, field: &str) -> Self {
        self.native_id_field = field.to_string();
        self
    }

    /// Set the multi-id lookup policy
    pub fn multi_get_policy(mut self, policy: MultiGetPolicy) -> Self {
        self.multi_get_policy = policy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.native_id_field.is_empty() {
            return Err(EntityError::InvalidConfig(
                "native_id_field cannot be empty".to_string(),
            ));
        }

        if self.native_id_field.contains('.') {
            return Err(EntityError::InvalidConfig(
                "native_id_field must be a top-level field".to_string(),
            ));
        }

        if self.native_id_field == ID_FIELD {
            return Err(EntityError::InvalidConfig(format!(
                "native_id_field must differ from the generic '{}' field",
                ID_FIELD
            )));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
