//! Document persistence.
//!
//! Services talk to a [`Database`], which hands out typed [`Collection`]s on
//! top of a [`DocumentStore`] backend. Two backends exist: MongoDB for real
//! deployments and an in-memory map used by tests and `memory://` runs.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON conversion error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Document is not an object in collection '{0}'")]
    NotAnObject(String),
    #[error("Sequence for '{0}' could not be advanced")]
    Sequence(String),
}

/// A single condition on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

/// Conjunction of field conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: i64) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn any_of<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.push(Condition::In(field.to_string(), values));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluates the filter against a JSON document.
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(field, expected) => document.get(field) == Some(expected),
            Condition::In(field, candidates) => document
                .get(field)
                .map(|actual| candidates.contains(actual))
                .unwrap_or(false),
        })
    }
}

/// Backend contract. Documents are JSON objects with an integer `id` field.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Advances and returns the id sequence of a collection, starting at 1.
    async fn next_id(&self, collection: &str) -> StoreResult<i64>;

    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Value>>;

    /// Returns matching documents ordered by ascending `id`.
    async fn find_many(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Replaces the first matching document. Returns whether one matched.
    async fn replace_one(&self, collection: &str, filter: &Filter, document: Value) -> StoreResult<bool>;

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<bool>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}

/// A persisted record living in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);
}

#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
}

impl Database {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Connects to the backend named by `url`: `memory://` or a MongoDB URI.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        if url.starts_with("memory://") {
            log::warn!("⚠️  Using in-memory store, data will not survive a restart");
            return Ok(Self::in_memory());
        }

        let store = MongoStore::connect(url).await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn collection<T: Entity>(&self) -> Collection<T> {
        Collection {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.store.ping().await
    }
}

/// Typed view over one collection.
pub struct Collection<T: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Collection<T> {
    /// Assigns the next id to `entity` and stores it.
    pub async fn insert(&self, entity: &mut T) -> StoreResult<()> {
        let id = self.store.next_id(T::COLLECTION).await?;
        entity.set_id(id);
        let document = serde_json::to_value(&*entity)?;
        self.store.insert(T::COLLECTION, document).await
    }

    pub async fn get(&self, id: i64) -> StoreResult<Option<T>> {
        self.find_one(&Filter::by_id(id)).await
    }

    pub async fn all(&self) -> StoreResult<Vec<T>> {
        self.find(&Filter::new()).await
    }

    pub async fn find_one(&self, filter: &Filter) -> StoreResult<Option<T>> {
        match self.store.find_one(T::COLLECTION, filter).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    pub async fn find(&self, filter: &Filter) -> StoreResult<Vec<T>> {
        self.store
            .find_many(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(StoreError::from))
            .collect()
    }

    /// Overwrites the stored record that has the same id.
    pub async fn replace(&self, entity: &T) -> StoreResult<bool> {
        let document = serde_json::to_value(entity)?;
        self.store
            .replace_one(T::COLLECTION, &Filter::by_id(entity.id()), document)
            .await
    }

    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.store.delete_one(T::COLLECTION, &Filter::by_id(id)).await
    }

    pub async fn delete_where(&self, filter: &Filter) -> StoreResult<u64> {
        self.store.delete_many(T::COLLECTION, filter).await
    }

    pub async fn exists(&self, filter: &Filter) -> StoreResult<bool> {
        Ok(self.store.count(T::COLLECTION, filter).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: i64,
        owner_id: i64,
        label: String,
    }

    impl Entity for Widget {
        const COLLECTION: &'static str = "widgets";

        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
    }

    fn widget(owner_id: i64, label: &str) -> Widget {
        Widget { id: 0, owner_id, label: label.to_string() }
    }

    #[test]
    fn filter_matches_equality_and_membership() {
        let doc = json!({ "id": 3, "owner_id": 7, "label": "a" });

        assert!(Filter::new().matches(&doc));
        assert!(Filter::by_id(3).eq("label", "a").matches(&doc));
        assert!(!Filter::by_id(3).eq("label", "b").matches(&doc));
        assert!(Filter::new().any_of("owner_id", [1, 7]).matches(&doc));
        assert!(!Filter::new().any_of("owner_id", Vec::<i64>::new()).matches(&doc));
        assert!(!Filter::new().eq("missing", 1).matches(&doc));
    }

    #[tokio::test]
    async fn collection_assigns_sequential_ids() {
        let db = Database::in_memory();
        let widgets = db.collection::<Widget>();

        let mut first = widget(1, "first");
        let mut second = widget(1, "second");
        widgets.insert(&mut first).await.unwrap();
        widgets.insert(&mut second).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(widgets.get(2).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn replace_and_delete_report_whether_a_row_matched() {
        let db = Database::in_memory();
        let widgets = db.collection::<Widget>();

        let mut w = widget(1, "before");
        widgets.insert(&mut w).await.unwrap();

        w.label = "after".to_string();
        assert!(widgets.replace(&w).await.unwrap());
        assert_eq!(widgets.get(w.id).await.unwrap().unwrap().label, "after");

        let ghost = Widget { id: 99, owner_id: 1, label: "ghost".into() };
        assert!(!widgets.replace(&ghost).await.unwrap());
        assert!(widgets.get(99).await.unwrap().is_none());

        assert!(widgets.delete(w.id).await.unwrap());
        assert!(!widgets.delete(w.id).await.unwrap());
    }

    #[tokio::test]
    async fn find_returns_only_matching_rows_in_id_order() {
        let db = Database::in_memory();
        let widgets = db.collection::<Widget>();

        for (owner, label) in [(2, "b"), (1, "a"), (2, "c")] {
            widgets.insert(&mut widget(owner, label)).await.unwrap();
        }

        let owned: Vec<String> = widgets
            .find(&Filter::new().eq("owner_id", 2))
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.label)
            .collect();

        assert_eq!(owned, vec!["b", "c"]);
        assert_eq!(widgets.delete_where(&Filter::new().eq("owner_id", 2)).await.unwrap(), 2);
        assert_eq!(widgets.all().await.unwrap().len(), 1);
    }
}
