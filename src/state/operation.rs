use crate::core::Entity;
use crate::query::{Filter, Patch};
use serde::{Deserialize, Serialize};

/// Declarative description of a pending change to an [`EntityPool`].
///
/// Operations carry everything needed to apply them later, so they can be
/// logged, replayed or shipped elsewhere without re-deriving them.
///
/// [`EntityPool`]: super::EntityPool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UpdateOperation {
    Insert {
        entity_type: String,
        entities: Vec<Entity>,
    },
    PatchById {
        entity_type: String,
        id: String,
        patch: Patch,
    },
    PatchByFilter {
        entity_type: String,
        #[serde(rename = "where")]
        filter: Filter,
        patch: Patch,
    },
    Remove {
        entity_type: String,
        selector: Selector,
    },
}

/// Which entities a removal targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Selector {
    Id(String),
    Where(Filter),
}

impl UpdateOperation {
    pub fn entity_type(&self) -> &str {
        match self {
            UpdateOperation::Insert { entity_type, .. }
            | UpdateOperation::PatchById { entity_type, .. }
            | UpdateOperation::PatchByFilter { entity_type, .. }
            | UpdateOperation::Remove { entity_type, .. } => entity_type,
        }
    }
}
