use super::pool::EntityPool;
use crate::core::{Entity, EntityError, Result};
use crate::interface::EntityStateFinder;
use crate::query::{IdQuery, IdsQuery, WhereQuery};
use std::collections::HashSet;

impl EntityStateFinder for EntityPool {
    fn find(&self, query: &WhereQuery) -> Vec<&Entity> {
        let Some(entities) = self.entities(&query.entity_type) else {
            return Vec::new();
        };
        entities
            .iter()
            .filter(|entity| query.filter.matches(entity.as_record()))
            .skip(query.skip.unwrap_or(0))
            // A zero limit means no limit, as in the document store.
            .take(query.limit.filter(|&n| n > 0).unwrap_or(usize::MAX))
            .collect()
    }

    fn find_one(&self, query: &WhereQuery) -> Option<&Entity> {
        let Some(entities) = self.entities(&query.entity_type) else {
            return None;
        };
        entities
            .iter()
            .filter(|entity| query.filter.matches(entity.as_record()))
            .nth(query.skip.unwrap_or(0))
    }

    fn get(&self, query: &IdQuery) -> Result<&Entity> {
        self.entities(&query.entity_type)
            .and_then(|entities| entities.get(&query.id))
            .ok_or_else(|| EntityError::not_found("get", query.to_string()))
    }

    fn get_by_ids(&self, query: &IdsQuery) -> Result<Vec<&Entity>> {
        let entities = self.entities(&query.entity_type);
        let mut seen = HashSet::new();
        let mut found = Vec::with_capacity(query.ids.len());
        let mut missing = Vec::new();

        for id in &query.ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match entities.and_then(|e| e.get(id)) {
                Some(entity) => found.push(entity),
                None => missing.push(id.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(EntityError::not_found(
                "getByIds",
                format!("{} (missing: {})", query, missing.join(", ")),
            ));
        }
        Ok(found)
    }

    fn has(&self, query: &IdQuery) -> bool {
        self.entities(&query.entity_type)
            .is_some_and(|entities| entities.contains(&query.id))
    }
}
