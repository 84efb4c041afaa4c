use super::{DocumentStore, Filter, StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    documents: HashMap<String, Vec<Value>>,
    sequences: HashMap<String, i64>,
}

/// Process-local store. Documents are kept in insertion order, which is also
/// ascending id order since ids come from the per-collection sequence.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn next_id(&self, collection: &str) -> StoreResult<i64> {
        let mut tables = self.tables.write().await;
        let seq = tables.sequences.entry(collection.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()> {
        if !document.is_object() {
            return Err(StoreError::NotAnObject(collection.to_string()));
        }
        let mut tables = self.tables.write().await;
        tables
            .documents
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Value>> {
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn find_many(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }

    async fn replace_one(&self, collection: &str, filter: &Filter, document: Value) -> StoreResult<bool> {
        if !document.is_object() {
            return Err(StoreError::NotAnObject(collection.to_string()));
        }
        let mut tables = self.tables.write().await;
        let slot = tables
            .documents
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| filter.matches(doc)));

        match slot {
            Some(existing) => {
                *existing = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(docs) = tables.documents.get_mut(collection) else {
            return Ok(false);
        };

        match docs.iter().position(|doc| filter.matches(doc)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let Some(docs) = tables.documents.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
