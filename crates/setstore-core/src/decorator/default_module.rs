use async_trait::async_trait;

use crate::error::Result;
use crate::settings::{SettingsValue, StoreValue, Value};
use crate::storage::SettingsStorage;

/// Passes `default_module` to the inner storage whenever the caller names no module
#[derive(Debug)]
pub struct DefaultModuleSettingsStorage<S> {
    inner: S,
    default_module: String,
}

impl<S: SettingsStorage> DefaultModuleSettingsStorage<S> {
    pub fn new(inner: S, default_module: impl Into<String>) -> Self {
        Self {
            inner,
            default_module: default_module.into(),
        }
    }

    pub fn default_module(&self) -> &str {
        &self.default_module
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn module<'a>(&'a self, module: Option<&'a str>) -> Option<&'a str> {
        Some(module.unwrap_or(&self.default_module))
    }
}

#[async_trait]
impl<S: SettingsStorage> SettingsStorage for DefaultModuleSettingsStorage<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        self.inner.delete(key, self.module(module)).await
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        self.inner.delete_all(self.module(module)).await
    }

    async fn delete_all_modules(&self) -> Result<()> {
        self.inner.delete_all_modules().await
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        self.inner.get(key, default, self.module(module)).await
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        self.inner.get_all(self.module(module)).await
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        self.inner.get_all_modules().await
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        self.inner.has(key, self.module(module)).await
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        self.inner.store(key, value, self.module(module)).await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        let values = values
            .into_iter()
            .map(|value| StoreValue {
                module: value.module.or_else(|| Some(self.default_module.clone())),
                ..value
            })
            .collect();
        self.inner.store_all(values).await
    }
}
