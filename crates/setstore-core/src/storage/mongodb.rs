use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::settings::{module_or_default, SettingsValue, StoreValue, Value};
use crate::storage::SettingsStorage;

/// Equality filter on the `module` and `key` fields; `None` matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsFilter {
    pub module: Option<String>,
    pub key: Option<String>,
}

impl SettingsFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn module(module: &str) -> Self {
        Self {
            module: Some(module.to_string()),
            key: None,
        }
    }

    pub fn entry(key: &str, module: &str) -> Self {
        Self {
            module: Some(module.to_string()),
            key: Some(key.to_string()),
        }
    }

    pub fn matches(&self, value: &SettingsValue) -> bool {
        self.module.as_ref().is_none_or(|module| *module == value.module)
            && self.key.as_ref().is_none_or(|key| *key == value.key)
    }
}

/// The slice of a MongoDB collection the settings storage needs
#[async_trait]
pub trait SettingsCollection: Send + Sync + Debug {
    async fn find_one(&self, filter: &SettingsFilter) -> Result<Option<SettingsValue>>;

    async fn find(&self, filter: &SettingsFilter) -> Result<Vec<SettingsValue>>;

    /// Replace the first match, inserting `value` when nothing matches
    async fn replace_one(&self, filter: &SettingsFilter, value: SettingsValue) -> Result<()>;

    /// Returns the number of removed documents
    async fn delete_many(&self, filter: &SettingsFilter) -> Result<u64>;
}

/// Collection held in process memory
#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: Mutex<Vec<SettingsValue>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsCollection for MemoryCollection {
    async fn find_one(&self, filter: &SettingsFilter) -> Result<Option<SettingsValue>> {
        let documents = self.documents.lock().await;
        Ok(documents.iter().find(|value| filter.matches(value)).cloned())
    }

    async fn find(&self, filter: &SettingsFilter) -> Result<Vec<SettingsValue>> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|value| filter.matches(value))
            .cloned()
            .collect())
    }

    async fn replace_one(&self, filter: &SettingsFilter, value: SettingsValue) -> Result<()> {
        let mut documents = self.documents.lock().await;
        match documents.iter_mut().find(|document| filter.matches(document)) {
            Some(document) => *document = value,
            None => documents.push(value),
        }
        Ok(())
    }

    async fn delete_many(&self, filter: &SettingsFilter) -> Result<u64> {
        let mut documents = self.documents.lock().await;
        let before = documents.len();
        documents.retain(|value| !filter.matches(value));
        Ok((before - documents.len()) as u64)
    }
}

#[cfg(feature = "mongodb")]
mod driver {
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use ::mongodb::bson::{self, Document};
    use ::mongodb::options::ReplaceOptions;
    use ::mongodb::Collection;

    use super::{SettingsCollection, SettingsFilter};
    use crate::error::{Error, Result};
    use crate::settings::SettingsValue;

    fn query(filter: &SettingsFilter) -> Document {
        let mut query = Document::new();
        if let Some(module) = &filter.module {
            query.insert("module", module.clone());
        }
        if let Some(key) = &filter.key {
            query.insert("key", key.clone());
        }
        query
    }

    fn decode(document: Document) -> Result<SettingsValue> {
        bson::from_document(document).map_err(|e| Error::deserialization("bson", e))
    }

    fn backend_error(operation: &str, error: ::mongodb::error::Error) -> Error {
        Error::backend("mongodb", operation, error)
    }

    #[async_trait]
    impl SettingsCollection for Collection<Document> {
        async fn find_one(&self, filter: &SettingsFilter) -> Result<Option<SettingsValue>> {
            let document = Collection::find_one(self, query(filter), None)
                .await
                .map_err(|e| backend_error("find_one", e))?;
            document.map(decode).transpose()
        }

        async fn find(&self, filter: &SettingsFilter) -> Result<Vec<SettingsValue>> {
            let documents: Vec<Document> = Collection::find(self, query(filter), None)
                .await
                .map_err(|e| backend_error("find", e))?
                .try_collect()
                .await
                .map_err(|e| backend_error("find", e))?;
            documents.into_iter().map(decode).collect()
        }

        async fn replace_one(&self, filter: &SettingsFilter, value: SettingsValue) -> Result<()> {
            let replacement =
                bson::to_document(&value).map_err(|e| Error::serialization("bson", e))?;
            let options = ReplaceOptions::builder().upsert(true).build();
            Collection::replace_one(self, query(filter), replacement, options)
                .await
                .map_err(|e| backend_error("replace_one", e))?;
            Ok(())
        }

        async fn delete_many(&self, filter: &SettingsFilter) -> Result<u64> {
            let result = Collection::delete_many(self, query(filter), None)
                .await
                .map_err(|e| backend_error("delete_many", e))?;
            Ok(result.deleted_count)
        }
    }
}

/// Storage keeping one `{module, key, value}` document per entry
#[derive(Debug)]
pub struct MongoDbSettingsStorage {
    collection: Arc<dyn SettingsCollection>,
}

impl MongoDbSettingsStorage {
    pub fn new(collection: Arc<dyn SettingsCollection>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl SettingsStorage for MongoDbSettingsStorage {
    fn name(&self) -> &str {
        "mongodb"
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        let filter = SettingsFilter::entry(key, module_or_default(module));
        self.collection.delete_many(&filter).await.map(|_| ())
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        let filter = SettingsFilter::module(module_or_default(module));
        self.collection.delete_many(&filter).await.map(|_| ())
    }

    async fn delete_all_modules(&self) -> Result<()> {
        self.collection
            .delete_many(&SettingsFilter::all())
            .await
            .map(|_| ())
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        let filter = SettingsFilter::entry(key, module_or_default(module));
        Ok(self
            .collection
            .find_one(&filter)
            .await?
            .map(|document| document.value)
            .filter(|value| !value.is_null())
            .unwrap_or(default))
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        let filter = SettingsFilter::module(module_or_default(module));
        self.collection.find(&filter).await
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        self.collection.find(&SettingsFilter::all()).await
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        let filter = SettingsFilter::entry(key, module_or_default(module));
        Ok(self.collection.find_one(&filter).await?.is_some())
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        let module = module_or_default(module);
        self.collection
            .replace_one(
                &SettingsFilter::entry(key, module),
                SettingsValue::new(module, key, value),
            )
            .await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        for value in values {
            self.store(&value.key, value.value, value.module.as_deref())
                .await?;
        }
        Ok(())
    }
}
