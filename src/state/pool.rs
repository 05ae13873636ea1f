use crate::core::Entity;
use im::{HashMap as ImHashMap, Vector};

/// Entities of one type, keyed by id and iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitiesById {
    order: Vector<String>,
    entities: ImHashMap<String, Entity>,
}

impl EntitiesById {
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.order.iter().filter_map(move |id| self.entities.get(id))
    }

    /// Inserts or replaces by `entity.id()`. A replaced entity keeps its
    /// original position.
    pub(crate) fn insert(&mut self, entity: Entity) {
        let id = entity.id().to_string();
        if !self.entities.contains_key(&id) {
            self.order.push_back(id.clone());
        }
        self.entities.insert(id, entity);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Entity> {
        let removed = self.entities.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }
}

/// In-memory state snapshot: entity type -> id -> entity.
///
/// Backed by persistent maps, so cloning a pool is cheap and applying an
/// update operation yields a new snapshot that shares unchanged structure
/// with the old one. A pool is never mutated in place by readers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPool {
    types: ImHashMap<String, EntitiesById>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self, entity_type: &str) -> Option<&EntitiesById> {
        self.types.get(entity_type)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.types.keys().map(String::as_str)
    }

    /// Total number of entities across all types.
    pub fn len(&self) -> usize {
        self.types.values().map(EntitiesById::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutable access to an existing type only; unknown types stay absent.
    pub(crate) fn existing_mut(&mut self, entity_type: &str) -> Option<&mut EntitiesById> {
        self.types.get_mut(entity_type)
    }

    pub(crate) fn entities_mut(&mut self, entity_type: &str) -> &mut EntitiesById {
        self.types
            .entry(entity_type.to_string())
            .or_insert_with(EntitiesById::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_survives_replace_and_remove() {
        let mut users = EntitiesById::default();
        users.insert(Entity::new("b"));
        users.insert(Entity::new("a"));
        users.insert(Entity::new("c"));
        users.insert(Entity::new("b").with("name", "Bea"));
        users.remove("a");

        let ids: Vec<&str> = users.iter().map(Entity::id).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(users.get("b").and_then(|e| e.get("name")), Some(&serde_json::json!("Bea")));
        assert!(users.remove("missing").is_none());
    }

    #[test]
    fn test_clone_is_an_independent_snapshot() {
        let mut pool = EntityPool::new();
        pool.entities_mut("users").insert(Entity::new("u1"));

        let snapshot = pool.clone();
        pool.entities_mut("users").insert(Entity::new("u2"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(pool.len(), 2);
        assert!(snapshot.entities("users").is_some_and(|e| !e.contains("u2")));
    }
}
