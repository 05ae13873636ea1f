use super::operation::{Selector, UpdateOperation};
use super::pool::EntityPool;
use crate::core::{Entity, EntityError, Record, Result};
use crate::interface::EntityStateUpdater;
use crate::query::{DeleteCommand, IdUpdateCommand, MultiUpdateCommand};

/// The pool only describes changes here; nothing is checked against or
/// written to the current snapshot. Existence is verified when the
/// operation is applied.
impl EntityStateUpdater for EntityPool {
    fn register(&self, entity_type: &str, entities: Vec<Record>) -> Result<UpdateOperation> {
        if entity_type.is_empty() {
            return Err(EntityError::InvalidCommand("entity type is empty".into()));
        }
        let entities = entities
            .into_iter()
            .map(|record| {
                Entity::from_record(record).map_err(|_| EntityError::MissingId(entity_type.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(UpdateOperation::Insert {
            entity_type: entity_type.to_string(),
            entities,
        })
    }

    fn update_by_id(&self, command: &IdUpdateCommand) -> Result<UpdateOperation> {
        command.validate()?;
        Ok(UpdateOperation::PatchById {
            entity_type: command.entity_type.clone(),
            id: command.id.clone(),
            patch: command.operation.clone(),
        })
    }

    fn update_multi(&self, command: &MultiUpdateCommand) -> Result<UpdateOperation> {
        command.validate()?;
        Ok(UpdateOperation::PatchByFilter {
            entity_type: command.entity_type.clone(),
            filter: command.filter.clone(),
            patch: command.operation.clone(),
        })
    }

    fn delete(&self, command: &DeleteCommand) -> Result<UpdateOperation> {
        command.validate()?;
        let selector = match command {
            DeleteCommand::ById(cmd) => Selector::Id(cmd.id.clone()),
            DeleteCommand::Multi(cmd) => Selector::Where(cmd.filter.clone()),
        };
        Ok(UpdateOperation::Remove {
            entity_type: command.entity_type().to_string(),
            selector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, Patch};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_register_requires_ids() {
        let pool = EntityPool::new();
        let op = pool
            .register("users", vec![record(json!({"id": "u1", "name": "Alice"}))])
            .unwrap();
        assert_eq!(op.entity_type(), "users");

        let err = pool
            .register("users", vec![record(json!({"id": "u1"})), record(json!({"name": "x"}))])
            .unwrap_err();
        assert!(matches!(err, EntityError::MissingId(t) if t == "users"));
    }

    #[test]
    fn test_update_and_delete_describe_without_applying() {
        let pool = EntityPool::new();

        let op = pool
            .update_by_id(&IdUpdateCommand::new("users", "ghost", Patch::new().set("a", 1)))
            .unwrap();
        assert!(matches!(op, UpdateOperation::PatchById { ref id, .. } if id == "ghost"));
        assert!(pool.is_empty());

        let op = pool
            .update_multi(&MultiUpdateCommand::new("users", Filter::eq("a", 1), Patch::new()))
            .unwrap();
        assert!(matches!(op, UpdateOperation::PatchByFilter { .. }));

        let op = pool.delete(&DeleteCommand::by_id("users", "u1")).unwrap();
        assert_eq!(
            op,
            UpdateOperation::Remove {
                entity_type: "users".into(),
                selector: Selector::Id("u1".into()),
            }
        );

        assert!(pool.delete(&DeleteCommand::by_id("", "u1")).is_err());
    }
}
