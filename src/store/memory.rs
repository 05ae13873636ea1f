//! In-process document store.
//!
//! Implements the collection contract over insertion-ordered vectors guarded
//! by async locks. Collections are created on first access, the way a
//! MongoDB database creates them on first write.

use super::collection::{
    DeleteResult, DocumentCollection, DocumentStore, FindOptions, InsertManyResult,
    InsertOneResult, UpdateResult,
};
use async_trait::async_trait;
use crate::core::{Record, StoreError, StoreResult};
use crate::query::{Filter, Patch};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{Level, event};
use uuid::Uuid;

pub struct MemoryDocumentStore {
    /// Collections by name; each collection carries its own lock
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
    key_field: String,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_key_field("_id")
    }

    pub fn with_key_field(key_field: impl Into<String>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            key_field: key_field.into(),
        }
    }

    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn drop_collection(&self, name: &str) -> bool {
        self.collections.write().await.remove(name).is_some()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn collection(&self, name: &str) -> StoreResult<Arc<dyn DocumentCollection>> {
        if let Some(existing) = self.collections.read().await.get(name) {
            let handle: Arc<dyn DocumentCollection> = existing.clone();
            return Ok(handle);
        }

        let mut collections = self.collections.write().await;
        let handle: Arc<dyn DocumentCollection> = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name, self.key_field.clone())))
            .clone();
        Ok(handle)
    }
}

pub struct MemoryCollection {
    name: String,
    key_field: String,
    documents: RwLock<Vec<Record>>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_field: key_field.into(),
            documents: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Assigns a generated key when the document has none.
    fn prepare(&self, mut document: Record) -> StoreResult<(String, Record)> {
        let existing = match document.get(&self.key_field) {
            None => None,
            Some(JsonValue::String(key)) if !key.is_empty() => Some(key.clone()),
            Some(other) => {
                return Err(StoreError::InvalidDocument(format!(
                    "'{}' must be a non-empty string, got {}",
                    self.key_field, other
                )));
            }
        };
        let key = match existing {
            Some(key) => key,
            None => {
                let generated = Uuid::new_v4().to_string();
                document.insert(self.key_field.clone(), JsonValue::String(generated.clone()));
                generated
            }
        };
        Ok((key, document))
    }

    fn key_of<'a>(&self, document: &'a Record) -> Option<&'a str> {
        document.get(&self.key_field).and_then(JsonValue::as_str)
    }

    fn duplicate(&self, key: &str) -> StoreError {
        StoreError::DuplicateKey {
            collection: self.name.clone(),
            key: key.to_string(),
        }
    }

    async fn update(&self, filter: &Filter, update: &Patch, many: bool) -> StoreResult<UpdateResult> {
        let mut documents = self.documents.write().await;

        // Patch everything first so a failing document leaves the batch unapplied.
        let mut patched = Vec::new();
        for (index, document) in documents.iter().enumerate() {
            if !filter.matches(document) {
                continue;
            }
            patched.push((index, update.apply(document, &self.key_field)?));
            if !many {
                break;
            }
        }

        let matched_count = patched.len();
        let mut modified_count = 0;
        for (index, next) in patched {
            if documents[index] != next {
                documents[index] = next;
                modified_count += 1;
            }
        }

        Ok(UpdateResult {
            matched_count,
            modified_count,
        })
    }

    async fn delete(&self, filter: &Filter, many: bool) -> StoreResult<DeleteResult> {
        let mut documents = self.documents.write().await;
        let before = documents.len();

        if many {
            documents.retain(|document| !filter.matches(document));
        } else if let Some(index) = documents.iter().position(|document| filter.matches(document)) {
            documents.remove(index);
        }

        Ok(DeleteResult {
            deleted_count: before - documents.len(),
        })
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Filter, options: FindOptions) -> StoreResult<Vec<Record>> {
        let documents = self.documents.read().await;
        // A zero limit means no limit, as in MongoDB.
        let limit = options.limit.filter(|&n| n > 0).unwrap_or(usize::MAX);
        Ok(documents
            .iter()
            .filter(|document| filter.matches(document))
            .skip(options.skip.unwrap_or(0))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_one(&self, document: Record) -> StoreResult<InsertOneResult> {
        let (key, document) = self.prepare(document)?;
        let mut documents = self.documents.write().await;
        if documents.iter().any(|existing| self.key_of(existing) == Some(key.as_str())) {
            return Err(self.duplicate(&key));
        }
        documents.push(document);
        event!(Level::TRACE, collection = %self.name, key = %key, "document inserted");
        Ok(InsertOneResult { inserted_id: key })
    }

    async fn insert_many(&self, documents: Vec<Record>) -> StoreResult<InsertManyResult> {
        let prepared = documents
            .into_iter()
            .map(|document| self.prepare(document))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut stored = self.documents.write().await;
        let mut keys: HashSet<String> = stored
            .iter()
            .filter_map(|document| self.key_of(document))
            .map(str::to_string)
            .collect();
        for (key, _) in &prepared {
            if !keys.insert(key.clone()) {
                return Err(self.duplicate(key));
            }
        }

        let mut inserted_ids = Vec::with_capacity(prepared.len());
        for (key, document) in prepared {
            stored.push(document);
            inserted_ids.push(key);
        }
        event!(
            Level::TRACE,
            collection = %self.name,
            count = inserted_ids.len(),
            "documents inserted"
        );
        Ok(InsertManyResult { inserted_ids })
    }

    async fn update_one(&self, filter: &Filter, update: &Patch) -> StoreResult<UpdateResult> {
        self.update(filter, update, false).await
    }

    async fn update_many(&self, filter: &Filter, update: &Patch) -> StoreResult<UpdateResult> {
        self.update(filter, update, true).await
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<DeleteResult> {
        self.delete(filter, false).await
    }

    async fn delete_many(&self, filter: &Filter) -> StoreResult<DeleteResult> {
        self.delete(filter, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_collections_are_created_on_first_access() {
        let store = MemoryDocumentStore::new();
        let users = store.collection("users").await.unwrap();
        users.insert_one(doc(json!({"name": "Alice"}))).await.unwrap();

        let again = store.collection("users").await.unwrap();
        let found = again.find(&Filter::all(), FindOptions::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(store.collection_names().await, vec!["users".to_string()]);
        assert!(store.drop_collection("users").await);
    }

    #[tokio::test]
    async fn test_insert_assigns_keys_and_rejects_duplicates() {
        let coll = MemoryCollection::new("users", "_id");
        let generated = coll.insert_one(doc(json!({"name": "A"}))).await.unwrap();
        assert!(Uuid::parse_str(&generated.inserted_id).is_ok());

        let fixed = coll.insert_one(doc(json!({"_id": "k1"}))).await.unwrap();
        assert_eq!(fixed.inserted_id, "k1");

        let err = coll.insert_one(doc(json!({"_id": "k1"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref key, .. } if key == "k1"));

        let err = coll
            .insert_many(vec![doc(json!({"_id": "k2"})), doc(json!({"_id": "k2"}))])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(coll.len().await, 2);

        assert!(coll.insert_one(doc(json!({"_id": 5}))).await.is_err());
    }

    #[tokio::test]
    async fn test_find_honors_skip_and_limit() {
        let coll = MemoryCollection::new("n", "_id");
        for i in 0..5 {
            coll.insert_one(doc(json!({"n": i}))).await.unwrap();
        }
        let options = FindOptions {
            skip: Some(1),
            limit: Some(2),
        };
        let found = coll.find(&Filter::all(), options).await.unwrap();
        let ns: Vec<&JsonValue> = found.iter().filter_map(|d| d.get("n")).collect();
        assert_eq!(ns, vec![&json!(1), &json!(2)]);

        let unlimited = coll.find(&Filter::all(), FindOptions::limit(0)).await.unwrap();
        assert_eq!(unlimited.len(), 5);
    }

    #[tokio::test]
    async fn test_update_counts_and_key_protection() {
        let coll = MemoryCollection::new("users", "_id");
        coll.insert_many(vec![
            doc(json!({"_id": "a", "team": "x", "score": 1})),
            doc(json!({"_id": "b", "team": "x", "score": 2})),
        ])
        .await
        .unwrap();

        let team_x = Filter::eq("team", "x");
        let result = coll.update_one(&team_x, &Patch::new().inc("score", 10)).await.unwrap();
        assert_eq!(result.matched_count, 1);

        let result = coll.update_many(&team_x, &Patch::new().set("team", "x")).await.unwrap();
        assert_eq!(result.matched_count, 2);
        assert_eq!(result.modified_count, 0);

        let err = coll
            .update_many(&team_x, &Patch::new().set("_id", "z"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedUpdate(_)));

        let a = coll.find(&Filter::eq("_id", "a"), FindOptions::default()).await.unwrap();
        assert_eq!(a[0].get("score"), Some(&json!(11)));
    }

    #[tokio::test]
    async fn test_delete_one_and_many() {
        let coll = MemoryCollection::new("users", "_id");
        for team in ["x", "x", "y"] {
            coll.insert_one(doc(json!({"team": team}))).await.unwrap();
        }
        let one = coll.delete_one(&Filter::eq("team", "x")).await.unwrap();
        assert_eq!(one.deleted_count, 1);
        let many = coll.delete_many(&Filter::all()).await.unwrap();
        assert_eq!(many.deleted_count, 2);
        let none = coll.delete_many(&Filter::all()).await.unwrap();
        assert_eq!(none.deleted_count, 0);
        assert!(coll.is_empty().await);
    }
}
