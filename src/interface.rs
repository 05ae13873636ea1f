use async_trait::async_trait;
use crate::core::{Entity, Record, Result};
use crate::query::{
    DeleteCommand, IdQuery, IdUpdateCommand, IdsQuery, InsertCommand, MultiInsertCommand,
    MultiUpdateCommand, SingleInsertCommand, UpdateCommand, WhereQuery,
};
use crate::state::UpdateOperation;

/// Read-only queries over an in-memory state snapshot.
///
/// Zero matches are not an error for `find` / `find_one`; `get` and
/// `get_by_ids` are strict and fail with `NotFound`.
pub trait EntityStateFinder {
    /// Matches in insertion order, after `skip` and capped at `limit`.
    fn find(&self, query: &WhereQuery) -> Vec<&Entity>;

    fn find_one(&self, query: &WhereQuery) -> Option<&Entity>;

    fn get(&self, query: &IdQuery) -> Result<&Entity>;

    /// All-or-nothing: fails if any requested id is absent.
    fn get_by_ids(&self, query: &IdsQuery) -> Result<Vec<&Entity>>;

    fn has(&self, query: &IdQuery) -> bool;
}

/// Describes state changes as [`UpdateOperation`] values without applying them.
pub trait EntityStateUpdater {
    fn register(&self, entity_type: &str, entities: Vec<Record>) -> Result<UpdateOperation>;

    fn update_by_id(&self, command: &IdUpdateCommand) -> Result<UpdateOperation>;

    fn update_multi(&self, command: &MultiUpdateCommand) -> Result<UpdateOperation>;

    fn delete(&self, command: &DeleteCommand) -> Result<UpdateOperation>;
}

/// Entity read/write contract against a backing store.
///
/// Unlike [`EntityStateFinder`], reads that match nothing fail with
/// `NotFound`. Deleting nothing is not an error. Write-then-read methods are
/// two independent store calls and are not atomic.
#[async_trait]
pub trait EntityClient: Send + Sync {
    async fn find(&self, query: &WhereQuery) -> Result<Vec<Entity>>;

    async fn find_one(&self, query: &WhereQuery) -> Result<Entity>;

    async fn get(&self, query: &IdQuery) -> Result<Entity>;

    async fn get_by_ids(&self, query: &IdsQuery) -> Result<Vec<Entity>>;

    /// Returns the number of inserted records.
    async fn insert(&self, command: &InsertCommand) -> Result<usize>;

    async fn insert_and_get(&self, command: &SingleInsertCommand) -> Result<Entity>;

    async fn insert_and_get_multi(&self, command: &MultiInsertCommand) -> Result<Vec<Entity>>;

    /// Returns the matched count; zero matches fail with `NotFound`.
    async fn update(&self, command: &UpdateCommand) -> Result<usize>;

    async fn update_and_get(&self, command: &IdUpdateCommand) -> Result<Entity>;

    /// Re-fetches with the update's filter, which may observe records other
    /// than the ones just updated if concurrent writes occur.
    async fn update_and_fetch(&self, command: &MultiUpdateCommand) -> Result<Vec<Entity>>;

    /// Returns the deleted count, which may be zero.
    async fn delete(&self, command: &DeleteCommand) -> Result<usize>;
}
