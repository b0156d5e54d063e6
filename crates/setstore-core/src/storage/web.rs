use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::settings::{module_or_default, plain_text, SettingsValue, StoreValue, Value};
use crate::storage::SettingsStorage;

/// Joins prefix, module and key into one storage key
pub const KEY_SEPARATOR: &str = "____";

/// A `localStorage`/`sessionStorage`-like string key/value area
#[async_trait]
pub trait StorageArea: Send + Sync + Debug {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Every key currently in the area
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Storage area held in process memory
#[derive(Debug, Default)]
pub struct MemoryStorageArea {
    items: RwLock<IndexMap<String, String>>,
}

impl MemoryStorageArea {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageArea for MemoryStorageArea {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().await.shift_remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.read().await.keys().cloned().collect())
    }
}

/// Storage over a shared string area.
///
/// Each entry lives under `<prefix>____<module>____<key>`; entries of other
/// prefixes in the same area are left alone. Values are kept as text: strings
/// verbatim, anything else as JSON text. Storing null removes the entry.
#[derive(Debug)]
pub struct WebStorageSettingsStorage {
    area: Arc<dyn StorageArea>,
    key_prefix: String,
}

impl WebStorageSettingsStorage {
    /// Fails when `key_prefix` contains the key separator
    pub fn new(area: Arc<dyn StorageArea>, key_prefix: impl Into<String>) -> Result<Self> {
        let key_prefix = key_prefix.into();
        if key_prefix.contains(KEY_SEPARATOR) {
            return Err(Error::InvalidConfiguration(format!(
                "key prefix '{key_prefix}' must not contain '{KEY_SEPARATOR}'"
            )));
        }

        Ok(Self { area, key_prefix })
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn storage_key(&self, key: &str, module: Option<&str>) -> Result<String> {
        let module = module_or_default(module);
        if module.contains(KEY_SEPARATOR) {
            return Err(Error::InvalidConfiguration(format!(
                "module '{module}' must not contain '{KEY_SEPARATOR}'"
            )));
        }

        Ok([self.key_prefix.as_str(), module, key].join(KEY_SEPARATOR))
    }

    /// Split a storage key of this prefix into (module, key)
    fn split_key<'a>(&self, storage_key: &'a str) -> Option<(&'a str, &'a str)> {
        storage_key
            .strip_prefix(self.key_prefix.as_str())?
            .strip_prefix(KEY_SEPARATOR)?
            .split_once(KEY_SEPARATOR)
    }

    async fn entries(&self, module: Option<&str>) -> Result<Vec<(String, SettingsValue)>> {
        let mut values = Vec::new();
        for storage_key in self.area.keys().await? {
            let Some((entry_module, key)) = self.split_key(&storage_key) else {
                continue;
            };
            if module.is_some_and(|module| module != entry_module) {
                continue;
            }
            let Some(value) = self.area.get_item(&storage_key).await? else {
                continue;
            };
            let entry = SettingsValue::new(entry_module, key, Value::String(value));
            values.push((storage_key, entry));
        }
        Ok(values)
    }

    async fn remove_entries(&self, module: Option<&str>) -> Result<()> {
        for (storage_key, _) in self.entries(module).await? {
            self.area.remove_item(&storage_key).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStorage for WebStorageSettingsStorage {
    fn name(&self) -> &str {
        "web-storage"
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        self.area.remove_item(&self.storage_key(key, module)?).await
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        self.remove_entries(Some(module_or_default(module))).await
    }

    async fn delete_all_modules(&self) -> Result<()> {
        self.remove_entries(None).await
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        Ok(self
            .area
            .get_item(&self.storage_key(key, module)?)
            .await?
            .map(Value::String)
            .unwrap_or(default))
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        let entries = self.entries(Some(module_or_default(module))).await?;
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        let entries = self.entries(None).await?;
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        Ok(self
            .area
            .get_item(&self.storage_key(key, module)?)
            .await?
            .is_some())
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        let storage_key = self.storage_key(key, module)?;
        if value.is_null() {
            return self.area.remove_item(&storage_key).await;
        }
        self.area.set_item(&storage_key, &plain_text(&value)).await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        for value in values {
            self.store(&value.key, value.value, value.module.as_deref())
                .await?;
        }
        Ok(())
    }
}
