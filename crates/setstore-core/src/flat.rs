//! Single-module key/value view over a [`SettingsStorage`].
use std::fmt::Debug;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;
use crate::settings::Value;
use crate::storage::SettingsStorage;

/// Flat key space without modules
#[async_trait]
pub trait FlatSettings: Send + Sync + Debug {
    /// Remove every key
    async fn clear(&self) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn get_all(&self) -> Result<IndexMap<String, Value>>;

    async fn get_keys(&self) -> Result<Vec<String>>;

    async fn has(&self, key: &str) -> Result<bool>;

    async fn store(&self, key: &str, value: Value) -> Result<()>;
}

/// One module of a [`SettingsStorage`] seen as [`FlatSettings`]
#[derive(Debug)]
pub struct ModuleView<S> {
    storage: S,
    module: String,
}

impl<S: SettingsStorage> ModuleView<S> {
    pub fn new(storage: S, module: impl Into<String>) -> Self {
        Self {
            storage,
            module: module.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[async_trait]
impl<S: SettingsStorage> FlatSettings for ModuleView<S> {
    async fn clear(&self) -> Result<()> {
        self.storage.delete_all(Some(&self.module)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage.delete(key, Some(&self.module)).await
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let value = self.storage.get(key, Value::Null, Some(&self.module)).await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn get_all(&self) -> Result<IndexMap<String, Value>> {
        Ok(self
            .storage
            .get_all(Some(&self.module))
            .await?
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect())
    }

    async fn get_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .storage
            .get_all(Some(&self.module))
            .await?
            .into_iter()
            .map(|entry| entry.key)
            .collect())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.storage.has(key, Some(&self.module)).await
    }

    async fn store(&self, key: &str, value: Value) -> Result<()> {
        self.storage.store(key, value, Some(&self.module)).await
    }
}
