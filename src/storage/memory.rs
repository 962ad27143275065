//! In-process document store.
//!
//! Backs the router tests and local runs without Redis. Collections are
//! nested `BTreeMap`s behind a Tokio `RwLock`.

use super::{order_documents, Direction, Document, DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type Collection = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a document wholesale. Used to seed fixtures.
    pub async fn insert(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();

        for (name, value) in fields {
            if value.is_null() {
                existing.remove(&name);
            } else {
                existing.insert(name, value);
            }
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let documents = self.list(collection).await?;
        Ok(order_documents(documents, field, direction, limit))
    }
}
