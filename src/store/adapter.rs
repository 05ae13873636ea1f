//! Entity client over a document store.
//!
//! Translates entity queries and commands into collection calls, mapping the
//! generic `id` to the store-native key on the way out and back on the way in.
//! Reads that match nothing fail with `NotFound`; deletes never do.

use super::collection::{DocumentCollection, DocumentStore, FindOptions};
use super::config::{ClientConfig, MultiGetPolicy};
use super::id_mapper::IdMapper;
use async_trait::async_trait;
use crate::core::{Entity, EntityError, Result};
use crate::interface::EntityClient;
use crate::query::{
    DeleteCommand, Filter, IdQuery, IdUpdateCommand, IdsQuery, InsertCommand, MultiInsertCommand,
    MultiUpdateCommand, SingleInsertCommand, UpdateCommand, WhereQuery,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

pub struct DocumentEntityClient<S> {
    store: S,
    mapper: IdMapper,
    config: ClientConfig,
}

impl<S: DocumentStore> DocumentEntityClient<S> {
    pub fn new(store: S) -> Self {
        let config = ClientConfig::default();
        Self {
            store,
            mapper: IdMapper::new(config.native_id_field.clone()),
            config,
        }
    }

    pub fn with_config(store: S, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            mapper: IdMapper::new(config.native_id_field.clone()),
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn mapper(&self) -> &IdMapper {
        &self.mapper
    }

    async fn collection(&self, entity_type: &str) -> Result<Arc<dyn DocumentCollection>> {
        Ok(self.store.collection(entity_type).await?)
    }

    /// Runs an already store-native filter and maps the results back.
    async fn find_native(
        &self,
        operation: &'static str,
        entity_type: &str,
        filter: &Filter,
        options: FindOptions,
        context: impl FnOnce() -> String,
    ) -> Result<Vec<Entity>> {
        let records = self.collection(entity_type).await?.find(filter, options).await?;
        if records.is_empty() {
            return Err(EntityError::not_found(operation, context()));
        }
        records
            .into_iter()
            .map(|record| self.mapper.inbound(entity_type, record))
            .collect()
    }

    async fn get_as(&self, operation: &'static str, query: &IdQuery) -> Result<Entity> {
        let filter = self.mapper.key_filter(&query.id);
        let mut found = self
            .find_native(operation, &query.entity_type, &filter, FindOptions::limit(1), || {
                query.to_string()
            })
            .await?;
        Ok(found.swap_remove(0))
    }

    async fn get_by_ids_as(&self, operation: &'static str, query: &IdsQuery) -> Result<Vec<Entity>> {
        let mut seen = HashSet::new();
        let requested: Vec<&str> = query
            .ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        let filter = self.mapper.keys_filter(requested.iter().copied());
        let records = self
            .collection(&query.entity_type)
            .await?
            .find(&filter, FindOptions::default())
            .await?;

        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            let entity = self.mapper.inbound(&query.entity_type, record)?;
            by_id.insert(entity.id().to_string(), entity);
        }

        let mut entities = Vec::with_capacity(requested.len());
        let mut missing = Vec::new();
        for id in requested {
            match by_id.remove(id) {
                Some(entity) => entities.push(entity),
                None => missing.push(id),
            }
        }

        if entities.is_empty() {
            return Err(EntityError::not_found(operation, query.to_string()));
        }
        if self.config.multi_get_policy == MultiGetPolicy::AllOrNothing && !missing.is_empty() {
            return Err(EntityError::not_found(
                operation,
                format!("{} (missing: {})", query, missing.join(", ")),
            ));
        }
        Ok(entities)
    }

    async fn insert_records(&self, command: &InsertCommand) -> Result<usize> {
        command.validate()?;
        let collection = self.collection(command.entity_type()).await?;
        let count = match command {
            InsertCommand::Single(cmd) => {
                collection
                    .insert_one(self.mapper.outbound_record(cmd.value.clone()))
                    .await?;
                1
            }
            InsertCommand::Multi(cmd) => {
                let documents = cmd
                    .values
                    .iter()
                    .cloned()
                    .map(|value| self.mapper.outbound_record(value))
                    .collect();
                collection.insert_many(documents).await?.inserted_ids.len()
            }
        };
        event!(Level::DEBUG, count, "entities inserted");
        Ok(count)
    }

    async fn insert_one_and_get(&self, command: &SingleInsertCommand) -> Result<Entity> {
        command.validate()?;
        let inserted = self
            .collection(&command.entity_type)
            .await?
            .insert_one(self.mapper.outbound_record(command.value.clone()))
            .await?;
        let query = IdQuery::new(command.entity_type.as_str(), inserted.inserted_id);
        self.get_as("insertAndGet.fetch", &query).await
    }

    async fn insert_many_and_get(&self, command: &MultiInsertCommand) -> Result<Vec<Entity>> {
        command.validate()?;
        let documents = command
            .values
            .iter()
            .cloned()
            .map(|value| self.mapper.outbound_record(value))
            .collect();
        let inserted = self
            .collection(&command.entity_type)
            .await?
            .insert_many(documents)
            .await?;
        let query = IdsQuery::new(command.entity_type.as_str(), inserted.inserted_ids);
        self.get_by_ids_as("insertAndGetMulti.fetch", &query).await
    }

    async fn update_records(&self, command: &UpdateCommand) -> Result<usize> {
        command.validate()?;
        let collection = self.collection(command.entity_type()).await?;
        let update = self.mapper.outbound_patch(command.operation());
        let result = match command {
            UpdateCommand::ById(cmd) => {
                collection
                    .update_one(&self.mapper.key_filter(&cmd.id), &update)
                    .await?
            }
            UpdateCommand::Multi(cmd) => {
                collection
                    .update_many(&self.mapper.outbound_filter(&cmd.filter), &update)
                    .await?
            }
        };
        if result.matched_count == 0 {
            return Err(EntityError::not_found("update", command.to_string()));
        }
        event!(
            Level::DEBUG,
            matched = result.matched_count,
            modified = result.modified_count,
            "entities updated"
        );
        Ok(result.matched_count)
    }

    async fn update_one_and_get(&self, command: &IdUpdateCommand) -> Result<Entity> {
        command.validate()?;
        let result = self
            .collection(&command.entity_type)
            .await?
            .update_one(
                &self.mapper.key_filter(&command.id),
                &self.mapper.outbound_patch(&command.operation),
            )
            .await?;
        let query = IdQuery::new(command.entity_type.as_str(), command.id.as_str());
        if result.matched_count == 0 {
            return Err(EntityError::not_found("updateAndGet", query.to_string()));
        }
        self.get_as("updateAndGet.fetch", &query).await
    }

    async fn update_many_and_fetch(&self, command: &MultiUpdateCommand) -> Result<Vec<Entity>> {
        command.validate()?;
        let filter = self.mapper.outbound_filter(&command.filter);
        let result = self
            .collection(&command.entity_type)
            .await?
            .update_many(&filter, &self.mapper.outbound_patch(&command.operation))
            .await?;
        let context = || format!("{} where {}", command.entity_type, command.filter);
        if result.matched_count == 0 {
            return Err(EntityError::not_found("updateAndFetch", context()));
        }
        self.find_native(
            "updateAndFetch.fetch",
            &command.entity_type,
            &filter,
            FindOptions::default(),
            context,
        )
        .await
    }

    async fn delete_records(&self, command: &DeleteCommand) -> Result<usize> {
        command.validate()?;
        let collection = self.collection(command.entity_type()).await?;
        let result = match command {
            DeleteCommand::ById(cmd) => collection.delete_one(&self.mapper.key_filter(&cmd.id)).await?,
            DeleteCommand::Multi(cmd) => {
                collection
                    .delete_many(&self.mapper.outbound_filter(&cmd.filter))
                    .await?
            }
        };
        event!(Level::DEBUG, deleted = result.deleted_count, "entities deleted");
        Ok(result.deleted_count)
    }
}

/// Logs a failed outcome inside the caller's span.
fn observe<T>(result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        if err.is_not_found() {
            event!(Level::DEBUG, error = %err, "no matching entities");
        } else {
            event!(Level::ERROR, error = %err, "entity operation failed");
        }
    }
    result
}

#[async_trait]
impl<S: DocumentStore> EntityClient for DocumentEntityClient<S> {
    async fn find(&self, query: &WhereQuery) -> Result<Vec<Entity>> {
        let span = info_span!("entity.find", entity_type = %query.entity_type);
        let filter = self.mapper.outbound_filter(&query.filter);
        let options = FindOptions {
            skip: query.skip,
            limit: query.limit,
        };
        let found = self
            .find_native("find", &query.entity_type, &filter, options, || query.to_string())
            .instrument(span.clone())
            .await;
        span.in_scope(|| observe(found))
    }

    async fn find_one(&self, query: &WhereQuery) -> Result<Entity> {
        let span = info_span!("entity.find_one", entity_type = %query.entity_type);
        let filter = self.mapper.outbound_filter(&query.filter);
        let options = FindOptions {
            skip: query.skip,
            limit: Some(1),
        };
        let found = self
            .find_native("findOne", &query.entity_type, &filter, options, || query.to_string())
            .instrument(span.clone())
            .await;
        span.in_scope(|| observe(found.map(|mut entities| entities.swap_remove(0))))
    }

    async fn get(&self, query: &IdQuery) -> Result<Entity> {
        let span = info_span!("entity.get", entity_type = %query.entity_type, id = %query.id);
        let found = self.get_as("get", query).instrument(span.clone()).await;
        span.in_scope(|| observe(found))
    }

    async fn get_by_ids(&self, query: &IdsQuery) -> Result<Vec<Entity>> {
        let span = info_span!(
            "entity.get_by_ids",
            entity_type = %query.entity_type,
            requested = query.ids.len()
        );
        let found = self.get_by_ids_as("getByIds", query).instrument(span.clone()).await;
        span.in_scope(|| observe(found))
    }

    async fn insert(&self, command: &InsertCommand) -> Result<usize> {
        let span = info_span!("entity.insert", entity_type = %command.entity_type());
        let inserted = self.insert_records(command).instrument(span.clone()).await;
        span.in_scope(|| observe(inserted))
    }

    async fn insert_and_get(&self, command: &SingleInsertCommand) -> Result<Entity> {
        let span = info_span!("entity.insert_and_get", entity_type = %command.entity_type);
        let entity = self.insert_one_and_get(command).instrument(span.clone()).await;
        span.in_scope(|| observe(entity))
    }

    async fn insert_and_get_multi(&self, command: &MultiInsertCommand) -> Result<Vec<Entity>> {
        let span = info_span!(
            "entity.insert_and_get_multi",
            entity_type = %command.entity_type,
            count = command.values.len()
        );
        let entities = self.insert_many_and_get(command).instrument(span.clone()).await;
        span.in_scope(|| observe(entities))
    }

    async fn update(&self, command: &UpdateCommand) -> Result<usize> {
        let span = info_span!("entity.update", entity_type = %command.entity_type());
        let updated = self.update_records(command).instrument(span.clone()).await;
        span.in_scope(|| observe(updated))
    }

    async fn update_and_get(&self, command: &IdUpdateCommand) -> Result<Entity> {
        let span = info_span!(
            "entity.update_and_get",
            entity_type = %command.entity_type,
            id = %command.id
        );
        let entity = self.update_one_and_get(command).instrument(span.clone()).await;
        span.in_scope(|| observe(entity))
    }

    async fn update_and_fetch(&self, command: &MultiUpdateCommand) -> Result<Vec<Entity>> {
        let span = info_span!("entity.update_and_fetch", entity_type = %command.entity_type);
        let entities = self.update_many_and_fetch(command).instrument(span.clone()).await;
        span.in_scope(|| observe(entities))
    }

    async fn delete(&self, command: &DeleteCommand) -> Result<usize> {
        let span = info_span!("entity.delete", entity_type = %command.entity_type());
        let deleted = self.delete_records(command).instrument(span.clone()).await;
        span.in_scope(|| observe(deleted))
    }
}
