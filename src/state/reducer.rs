//! Applies update operations to produce a new pool snapshot.

use super::operation::{Selector, UpdateOperation};
use super::pool::{EntitiesById, EntityPool};
use crate::core::entity::ID_FIELD;
use crate::core::{Entity, EntityError, Result};
use crate::query::{Filter, Patch};
use tracing::{Level, event};

impl EntityPool {
    /// Returns the snapshot that results from applying `operation`. The
    /// receiver is left untouched.
    pub fn apply(&self, operation: &UpdateOperation) -> Result<EntityPool> {
        let mut next = self.clone();
        next.apply_in_place(operation)?;
        Ok(next)
    }

    /// Applies operations in order; the first failure discards the batch.
    pub fn apply_all<'a, I>(&self, operations: I) -> Result<EntityPool>
    where
        I: IntoIterator<Item = &'a UpdateOperation>,
    {
        let mut next = self.clone();
        for operation in operations {
            next.apply_in_place(operation)?;
        }
        Ok(next)
    }

    fn apply_in_place(&mut self, operation: &UpdateOperation) -> Result<()> {
        event!(
            Level::TRACE,
            entity_type = %operation.entity_type(),
            "applying update operation"
        );
        match operation {
            UpdateOperation::Insert {
                entity_type,
                entities,
            } => {
                let target = self.entities_mut(entity_type);
                for entity in entities {
                    target.insert(entity.clone());
                }
            }
            UpdateOperation::PatchById {
                entity_type,
                id,
                patch,
            } => {
                let missing =
                    || EntityError::not_found("updateById", format!("{}/{}", entity_type, id));
                let target = self.existing_mut(entity_type).ok_or_else(missing)?;
                let current = target.get(id).ok_or_else(missing)?;
                let patched = patch_entity(current, patch)?;
                target.insert(patched);
            }
            UpdateOperation::PatchByFilter {
                entity_type,
                filter,
                patch,
            } => {
                let Some(target) = self.existing_mut(entity_type) else {
                    return Ok(());
                };
                let patched = matching(target, filter)
                    .map(|entity| patch_entity(entity, patch))
                    .collect::<Result<Vec<_>>>()?;
                for entity in patched {
                    target.insert(entity);
                }
            }
            UpdateOperation::Remove {
                entity_type,
                selector,
            } => {
                let Some(target) = self.existing_mut(entity_type) else {
                    return Ok(());
                };
                match selector {
                    Selector::Id(id) => {
                        target.remove(id);
                    }
                    Selector::Where(filter) => {
                        let ids: Vec<String> = matching(target, filter)
                            .map(|entity| entity.id().to_string())
                            .collect();
                        for id in ids {
                            target.remove(&id);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn matching<'a>(
    entities: &'a EntitiesById,
    filter: &'a Filter,
) -> impl Iterator<Item = &'a Entity> + 'a {
    entities
        .iter()
        .filter(move |entity| filter.matches(entity.as_record()))
}

fn patch_entity(entity: &Entity, patch: &Patch) -> Result<Entity> {
    let record = patch.apply(entity.as_record(), ID_FIELD)?;
    Entity::from_record(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PatchError;
    use crate::interface::{EntityStateFinder, EntityStateUpdater};
    use crate::query::{DeleteCommand, IdQuery, IdUpdateCommand, MultiUpdateCommand, WhereQuery};
    use serde_json::json;

    fn seeded() -> EntityPool {
        let pool = EntityPool::new();
        let op = pool
            .register(
                "users",
                vec![
                    json!({"id": "u1", "name": "Alice", "age": 30}),
                    json!({"id": "u2", "name": "Bob", "age": 17}),
                ]
                .into_iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
            )
            .unwrap();
        pool.apply(&op).unwrap()
    }

    #[test]
    fn test_registered_entity_is_retrievable() {
        let pool = seeded();
        let alice = pool.get(&IdQuery::new("users", "u1")).unwrap();
        assert_eq!(alice.get("name"), Some(&json!("Alice")));
    }

    #[test]
    fn test_apply_leaves_original_snapshot_alone() {
        let before = seeded();
        let op = before.delete(&DeleteCommand::by_id("users", "u1")).unwrap();
        let after = before.apply(&op).unwrap();

        assert!(before.has(&IdQuery::new("users", "u1")));
        assert!(!after.has(&IdQuery::new("users", "u1")));
    }

    #[test]
    fn test_patch_by_id_checks_existence_on_apply() {
        let pool = seeded();
        let op = pool
            .update_by_id(&IdUpdateCommand::new("users", "ghost", Patch::new().set("a", 1)))
            .unwrap();
        assert!(pool.apply(&op).unwrap_err().is_not_found());

        let rename = pool
            .update_by_id(&IdUpdateCommand::new("users", "u1", Patch::new().set("name", "Alicia")))
            .unwrap();
        let next = pool.apply(&rename).unwrap();
        let alicia = next.get(&IdQuery::new("users", "u1")).unwrap();
        assert_eq!(alicia.get("name"), Some(&json!("Alicia")));
        assert_eq!(alicia.get("age"), Some(&json!(30)));
    }

    #[test]
    fn test_patch_cannot_rekey_entity() {
        let pool = seeded();
        let op = pool
            .update_by_id(&IdUpdateCommand::new("users", "u1", Patch::new().set("id", "u9")))
            .unwrap();
        assert!(matches!(
            pool.apply(&op),
            Err(EntityError::InvalidOperation(PatchError::IdentifierChange(_)))
        ));
    }

    #[test]
    fn test_patch_and_remove_by_filter() {
        let pool = seeded();
        let minors = Filter::parse(&json!({"age": {"$lt": 18}})).unwrap();
        let ops = vec![
            pool.update_multi(&MultiUpdateCommand::new(
                "users",
                minors,
                Patch::new().set("minor", true),
            ))
            .unwrap(),
            pool.delete(&DeleteCommand::by_filter("users", Filter::eq("minor", true)))
                .unwrap(),
        ];

        let next = pool.apply_all(&ops).unwrap();
        let everyone = next.find(&WhereQuery::new("users", Filter::all()));
        assert_eq!(everyone.len(), 1);
        assert_eq!(everyone[0].id(), "u1");

        // matching nothing is a no-op, not an error
        let none = pool
            .delete(&DeleteCommand::by_filter("users", Filter::eq("age", 99)))
            .unwrap();
        assert_eq!(pool.apply(&none).unwrap(), pool);
    }

    #[test]
    fn test_unknown_type_is_left_out_of_the_snapshot() {
        let pool = seeded();
        let ops = vec![
            pool.delete(&DeleteCommand::by_id("ghosts", "g1")).unwrap(),
            pool.delete(&DeleteCommand::by_filter("ghosts", Filter::all()))
                .unwrap(),
            pool.update_multi(&MultiUpdateCommand::new(
                "ghosts",
                Filter::all(),
                Patch::new().set("a", 1),
            ))
            .unwrap(),
        ];

        let next = pool.apply_all(&ops).unwrap();
        assert_eq!(next, pool);
        assert_eq!(next.entity_types().collect::<Vec<_>>(), vec!["users"]);

        let op = pool
            .update_by_id(&IdUpdateCommand::new("ghosts", "g1", Patch::new().set("a", 1)))
            .unwrap();
        assert!(pool.apply(&op).unwrap_err().is_not_found());
    }
}
