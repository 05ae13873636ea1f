//! Collection handle contract consumed by the store adapter.
//!
//! Filters and records crossing this boundary use the store-native key
//! field. Implementations own connection handling, timeouts and isolation.

use async_trait::async_trait;
use crate::core::{Record, StoreResult};
use crate::query::{Filter, Patch};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn limit(limit: usize) -> Self {
        Self {
            skip: None,
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOneResult {
    pub inserted_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertManyResult {
    pub inserted_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: usize,
    pub modified_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: usize,
}

/// One entity type's storage location.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;

    async fn find(&self, filter: &Filter, options: FindOptions) -> StoreResult<Vec<Record>>;

    async fn insert_one(&self, document: Record) -> StoreResult<InsertOneResult>;

    async fn insert_many(&self, documents: Vec<Record>) -> StoreResult<InsertManyResult>;

    async fn update_one(&self, filter: &Filter, update: &Patch) -> StoreResult<UpdateResult>;

    async fn update_many(&self, filter: &Filter, update: &Patch) -> StoreResult<UpdateResult>;

    async fn delete_one(&self, filter: &Filter) -> StoreResult<DeleteResult>;

    async fn delete_many(&self, filter: &Filter) -> StoreResult<DeleteResult>;
}

/// Hands out collection handles by entity type name.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn collection(&self, name: &str) -> StoreResult<Arc<dyn DocumentCollection>>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn collection(&self, name: &str) -> StoreResult<Arc<dyn DocumentCollection>> {
        (**self).collection(name).await
    }
}
