use super::{Condition, DocumentStore, Filter, StoreError, StoreResult};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, to_document, Bson, Document};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde_json::Value;

const COUNTERS: &str = "counters";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str) -> StoreResult<Self> {
        let mut client_options = ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Database name comes from the URI path, e.g. mongodb://host/MedBotAssistDB
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':') && !s.contains('@'))
            .unwrap_or("MedBotAssistDB");

        let db = client.database(db_name);
        db.list_collection_names().await?;

        log::info!("✅ MongoDB connected (database: {})", db_name);

        let store = Self { db };
        store.ensure_indexes().await?;

        Ok(store)
    }

    /// Creates the indexes backing id lookups, uniqueness rules and the
    /// filtered queries issued by the services.
    async fn ensure_indexes(&self) -> StoreResult<()> {
        log::info!("🔧 Creating database indexes...");

        let unique = [
            ("users", doc! { "id": 1 }),
            ("users", doc! { "username": 1 }),
            ("roles", doc! { "id": 1 }),
            ("roles", doc! { "name": 1 }),
            ("permissions", doc! { "id": 1 }),
            ("permissions", doc! { "name": 1 }),
            ("user_roles", doc! { "id": 1 }),
            ("role_permissions", doc! { "id": 1 }),
            ("role_permissions", doc! { "role_id": 1, "permission_id": 1 }),
            ("specialties", doc! { "id": 1 }),
            ("doctors", doc! { "id": 1 }),
            ("doctors", doc! { "user_id": 1 }),
            ("patients", doc! { "id": 1 }),
            ("patients", doc! { "identification_number": 1 }),
            ("appointments", doc! { "id": 1 }),
            ("medical_notes", doc! { "id": 1 }),
            ("clinical_summaries", doc! { "id": 1 }),
            ("chatbot_interactions", doc! { "id": 1 }),
        ];

        let lookups = [
            ("user_roles", doc! { "user_id": 1 }),
            ("doctors", doc! { "specialty_id": 1 }),
            ("appointments", doc! { "doctor_id": 1, "appointment_date": 1 }),
            ("appointments", doc! { "patient_id": 1 }),
            ("medical_notes", doc! { "appointment_id": 1 }),
            ("clinical_summaries", doc! { "note_id": 1 }),
            ("chatbot_interactions", doc! { "user_id": 1, "conversation_id": 1 }),
        ];

        for (collection, keys) in unique {
            let index = IndexModel::builder()
                .keys(keys.clone())
                .options(IndexOptions::builder().unique(true).build())
                .build();
            match self.raw(collection).create_index(index).await {
                Ok(_) => log::info!("   ✅ Unique index: {}({:?})", collection, keys.keys().collect::<Vec<_>>()),
                Err(e) => log::debug!("   ℹ️  Index on {} not created: {}", collection, e),
            }
        }

        for (collection, keys) in lookups {
            let index = IndexModel::builder().keys(keys.clone()).build();
            match self.raw(collection).create_index(index).await {
                Ok(_) => log::info!("   ✅ Index: {}({:?})", collection, keys.keys().collect::<Vec<_>>()),
                Err(e) => log::debug!("   ℹ️  Index on {} not created: {}", collection, e),
            }
        }

        log::info!("✅ Database indexes ready");
        Ok(())
    }

    fn raw(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }

}

fn to_mongo_filter(filter: &Filter) -> StoreResult<Document> {
    let mut out = Document::new();
    for condition in filter.conditions() {
        match condition {
            Condition::Eq(field, value) => {
                out.insert(field.clone(), to_bson(value)?);
            }
            Condition::In(field, values) => {
                let values = values.iter().map(to_bson).collect::<Result<Vec<_>, _>>()?;
                out.insert(field.clone(), doc! { "$in": values });
            }
        }
    }
    Ok(out)
}

fn to_mongo_document(collection: &str, value: &Value) -> StoreResult<Document> {
    if !value.is_object() {
        return Err(StoreError::NotAnObject(collection.to_string()));
    }
    Ok(to_document(value)?)
}

fn from_mongo_document(mut document: Document) -> Value {
    document.remove("_id");
    Bson::Document(document).into_relaxed_extjson()
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn next_id(&self, collection: &str) -> StoreResult<i64> {
        let counter = self
            .raw(COUNTERS)
            .find_one_and_update(doc! { "_id": collection }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        counter
            .and_then(|c| c.get_i64("seq").ok())
            .ok_or_else(|| StoreError::Sequence(collection.to_string()))
    }

    async fn insert(&self, collection: &str, document: Value) -> StoreResult<()> {
        let document = to_mongo_document(collection, &document)?;
        self.raw(collection).insert_one(document).await?;
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Value>> {
        let found = self.raw(collection).find_one(to_mongo_filter(filter)?).await?;
        Ok(found.map(from_mongo_document))
    }

    async fn find_many(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        let cursor = self
            .raw(collection)
            .find(to_mongo_filter(filter)?)
            .sort(doc! { "id": 1 })
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(from_mongo_document).collect())
    }

    async fn replace_one(&self, collection: &str, filter: &Filter, document: Value) -> StoreResult<bool> {
        let replacement = to_mongo_document(collection, &document)?;
        let result = self
            .raw(collection)
            .replace_one(to_mongo_filter(filter)?, replacement)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<bool> {
        let result = self.raw(collection).delete_one(to_mongo_filter(filter)?).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let result = self.raw(collection).delete_many(to_mongo_filter(filter)?).await?;
        Ok(result.deleted_count)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        Ok(self.raw(collection).count_documents(to_mongo_filter(filter)?).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn translates_filters_to_mongo_queries() {
        let filter = Filter::new().eq("doctor_id", 4).any_of("note_id", [1, 2]);
        let query = to_mongo_filter(&filter).unwrap();

        assert!(matches!(query.get("doctor_id"), Some(Bson::Int64(4)) | Some(Bson::Int32(4))));
        let note_clause = query.get_document("note_id").unwrap();
        assert_eq!(note_clause.get_array("$in").unwrap().len(), 2);
    }

    #[test]
    fn strips_object_id_when_reading_back() {
        let mut document = to_document(&json!({ "id": 9, "name": "Cardiology" })).unwrap();
        document.insert("_id", mongodb::bson::oid::ObjectId::new());

        let value = from_mongo_document(document);
        assert_eq!(value, json!({ "id": 9, "name": "Cardiology" }));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL").unwrap_or_else(|_| "mongodb://localhost:27017/MedBotAssistTest".to_string());
        let store = MongoStore::connect(&uri).await;
        assert!(store.is_ok());
    }
}
