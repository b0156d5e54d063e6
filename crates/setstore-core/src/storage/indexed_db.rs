//! Storage over an IndexedDB-like versioned object database.
//!
//! Records `{module, key, value}` live in the `settings` object store keyed by
//! `[module, key]`, with a `module` index for per-module queries. Databases
//! older than [`DATABASE_VERSION`] are upgraded when the storage is opened;
//! the version 1 layout (values keyed by plain key, no modules) is migrated
//! into the default module.
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::json;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::settings::{module_or_default, SettingsValue, StoreValue, Value, DEFAULT_MODULE};
use crate::storage::SettingsStorage;

pub const DATABASE_VERSION: u32 = 2;

pub const STORE_NAME_SETTINGS: &str = "settings";

pub const INDEX_NAME_MODULE: &str = "module";

/// Versioned database of named object stores.
///
/// Keys are arbitrary JSON values (a string, or an array for compound keys).
#[async_trait]
pub trait ObjectDatabase: Send + Sync + Debug {
    /// Schema version, 0 for a database that was never set up
    async fn version(&self) -> Result<u32>;

    async fn set_version(&self, version: u32) -> Result<()>;

    async fn has_store(&self, store: &str) -> Result<bool>;

    async fn create_store(&self, store: &str) -> Result<()>;

    async fn delete_store(&self, store: &str) -> Result<()>;

    /// Index records of `store` by the value of their `field`
    async fn create_index(&self, store: &str, index: &str, field: &str) -> Result<()>;

    async fn get(&self, store: &str, key: &Value) -> Result<Option<Value>>;

    async fn put(&self, store: &str, key: Value, record: Value) -> Result<()>;

    async fn delete(&self, store: &str, key: &Value) -> Result<()>;

    async fn clear(&self, store: &str) -> Result<()>;

    /// Every `(key, record)` pair of a store
    async fn entries(&self, store: &str) -> Result<Vec<(Value, Value)>>;

    /// Every `(key, record)` pair whose indexed field equals `value`
    async fn entries_by_index(
        &self,
        store: &str,
        index: &str,
        value: &Value,
    ) -> Result<Vec<(Value, Value)>>;
}

/// Opens databases by name
#[async_trait]
pub trait ObjectDatabaseFactory: Send + Sync + Debug {
    async fn open(&self, name: &str) -> Result<Arc<dyn ObjectDatabase>>;
}

#[derive(Debug, Default)]
struct MemoryObjectStore {
    /// index name -> indexed field
    indexes: IndexMap<String, String>,
    /// key text -> (key, record)
    records: IndexMap<String, (Value, Value)>,
}

#[derive(Debug, Default)]
struct MemoryDatabaseState {
    version: u32,
    stores: IndexMap<String, MemoryObjectStore>,
}

/// Object database held in process memory
#[derive(Debug, Default)]
pub struct MemoryObjectDatabase {
    state: Mutex<MemoryDatabaseState>,
}

impl MemoryObjectDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_store(store: &str) -> Error {
    Error::backend("indexeddb", "transaction", format!("object store '{store}' not found"))
}

#[async_trait]
impl ObjectDatabase for MemoryObjectDatabase {
    async fn version(&self) -> Result<u32> {
        Ok(self.state.lock().await.version)
    }

    async fn set_version(&self, version: u32) -> Result<()> {
        self.state.lock().await.version = version;
        Ok(())
    }

    async fn has_store(&self, store: &str) -> Result<bool> {
        Ok(self.state.lock().await.stores.contains_key(store))
    }

    async fn create_store(&self, store: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.stores.contains_key(store) {
            return Err(Error::backend(
                "indexeddb",
                "create_store",
                format!("object store '{store}' already exists"),
            ));
        }
        state
            .stores
            .insert(store.to_string(), MemoryObjectStore::default());
        Ok(())
    }

    async fn delete_store(&self, store: &str) -> Result<()> {
        self.state.lock().await.stores.shift_remove(store);
        Ok(())
    }

    async fn create_index(&self, store: &str, index: &str, field: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let object_store = state
            .stores
            .get_mut(store)
            .ok_or_else(|| missing_store(store))?;
        object_store
            .indexes
            .insert(index.to_string(), field.to_string());
        Ok(())
    }

    async fn get(&self, store: &str, key: &Value) -> Result<Option<Value>> {
        let state = self.state.lock().await;
        let object_store = state.stores.get(store).ok_or_else(|| missing_store(store))?;
        Ok(object_store
            .records
            .get(&key.to_string())
            .map(|(_, record)| record.clone()))
    }

    async fn put(&self, store: &str, key: Value, record: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        let object_store = state
            .stores
            .get_mut(store)
            .ok_or_else(|| missing_store(store))?;
        object_store.records.insert(key.to_string(), (key, record));
        Ok(())
    }

    async fn delete(&self, store: &str, key: &Value) -> Result<()> {
        let mut state = self.state.lock().await;
        let object_store = state
            .stores
            .get_mut(store)
            .ok_or_else(|| missing_store(store))?;
        object_store.records.shift_remove(&key.to_string());
        Ok(())
    }

    async fn clear(&self, store: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let object_store = state
            .stores
            .get_mut(store)
            .ok_or_else(|| missing_store(store))?;
        object_store.records.clear();
        Ok(())
    }

    async fn entries(&self, store: &str) -> Result<Vec<(Value, Value)>> {
        let state = self.state.lock().await;
        let object_store = state.stores.get(store).ok_or_else(|| missing_store(store))?;
        Ok(object_store.records.values().cloned().collect())
    }

    async fn entries_by_index(
        &self,
        store: &str,
        index: &str,
        value: &Value,
    ) -> Result<Vec<(Value, Value)>> {
        let state = self.state.lock().await;
        let object_store = state.stores.get(store).ok_or_else(|| missing_store(store))?;
        let field = object_store.indexes.get(index).ok_or_else(|| {
            Error::backend("indexeddb", "index", format!("index '{index}' not found"))
        })?;
        Ok(object_store
            .records
            .values()
            .filter(|(_, record)| record.get(field) == Some(value))
            .cloned()
            .collect())
    }
}

/// Hands out one shared [`MemoryObjectDatabase`] per name
#[derive(Debug, Default)]
pub struct MemoryObjectDatabaseFactory {
    databases: Mutex<IndexMap<String, Arc<MemoryObjectDatabase>>>,
}

impl MemoryObjectDatabaseFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectDatabaseFactory for MemoryObjectDatabaseFactory {
    async fn open(&self, name: &str) -> Result<Arc<dyn ObjectDatabase>> {
        let database = self
            .databases
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .clone();
        Ok(database)
    }
}

/// Settings storage over an [`ObjectDatabase`]
#[derive(Debug)]
pub struct IndexedDbSettingsStorage {
    database: Arc<dyn ObjectDatabase>,
}

impl IndexedDbSettingsStorage {
    /// Open a database by name and bring its schema up to date
    pub async fn open(factory: &dyn ObjectDatabaseFactory, name: &str) -> Result<Self> {
        let database = factory.open(name).await?;
        Self::new(database).await
    }

    /// Bring the schema of `database` up to date and wrap it
    pub async fn new(database: Arc<dyn ObjectDatabase>) -> Result<Self> {
        upgrade(database.as_ref()).await?;
        Ok(Self { database })
    }

    fn record_key(key: &str, module: &str) -> Value {
        json!([module, key])
    }

    fn record(key: &str, value: Value, module: &str) -> Value {
        json!({ "module": module, "key": key, "value": value })
    }

    async fn put(&self, key: &str, value: Value, module: &str) -> Result<()> {
        self.database
            .put(
                STORE_NAME_SETTINGS,
                Self::record_key(key, module),
                Self::record(key, value, module),
            )
            .await
    }
}

async fn upgrade(database: &dyn ObjectDatabase) -> Result<()> {
    let old_version = database.version().await?;
    if old_version >= DATABASE_VERSION {
        return Ok(());
    }

    info!("Upgrading settings database from version {old_version} to {DATABASE_VERSION}");

    let mut legacy = Vec::new();
    if old_version == 1 && database.has_store(STORE_NAME_SETTINGS).await? {
        legacy = database.entries(STORE_NAME_SETTINGS).await?;
        database.delete_store(STORE_NAME_SETTINGS).await?;
    }

    if !database.has_store(STORE_NAME_SETTINGS).await? {
        database.create_store(STORE_NAME_SETTINGS).await?;
    }
    database
        .create_index(STORE_NAME_SETTINGS, INDEX_NAME_MODULE, "module")
        .await?;

    if !legacy.is_empty() {
        debug!("Migrating {} version 1 setting(s)", legacy.len());
    }
    for (key, value) in legacy {
        let key = match key {
            Value::String(key) => key,
            other => other.to_string(),
        };
        database
            .put(
                STORE_NAME_SETTINGS,
                json!([DEFAULT_MODULE, key]),
                json!({ "module": DEFAULT_MODULE, "key": key, "value": value }),
            )
            .await?;
    }

    database.set_version(DATABASE_VERSION).await
}

fn to_settings_value(record: Value) -> Result<SettingsValue> {
    serde_json::from_value(record).map_err(|e| Error::backend("indexeddb", "read", e))
}

#[async_trait]
impl SettingsStorage for IndexedDbSettingsStorage {
    fn name(&self) -> &str {
        "indexeddb"
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        let record_key = Self::record_key(key, module_or_default(module));
        self.database.delete(STORE_NAME_SETTINGS, &record_key).await
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        let module = Value::from(module_or_default(module));
        let entries = self
            .database
            .entries_by_index(STORE_NAME_SETTINGS, INDEX_NAME_MODULE, &module)
            .await?;
        for (record_key, _) in entries {
            self.database.delete(STORE_NAME_SETTINGS, &record_key).await?;
        }
        Ok(())
    }

    async fn delete_all_modules(&self) -> Result<()> {
        self.database.clear(STORE_NAME_SETTINGS).await
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        let record_key = Self::record_key(key, module_or_default(module));
        let value = self
            .database
            .get(STORE_NAME_SETTINGS, &record_key)
            .await?
            .and_then(|mut record| record.get_mut("value").map(Value::take))
            .filter(|value| !value.is_null());
        Ok(value.unwrap_or(default))
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        let module = Value::from(module_or_default(module));
        self.database
            .entries_by_index(STORE_NAME_SETTINGS, INDEX_NAME_MODULE, &module)
            .await?
            .into_iter()
            .map(|(_, record)| to_settings_value(record))
            .collect()
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        self.database
            .entries(STORE_NAME_SETTINGS)
            .await?
            .into_iter()
            .map(|(_, record)| to_settings_value(record))
            .collect()
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        let record_key = Self::record_key(key, module_or_default(module));
        Ok(self
            .database
            .get(STORE_NAME_SETTINGS, &record_key)
            .await?
            .is_some())
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        self.put(key, value, module_or_default(module)).await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        for value in values {
            self.put(&value.key, value.value, module_or_default(value.module.as_deref()))
                .await?;
        }
        Ok(())
    }
}
