//! # Settings Storages
//!
//! Every backend implements [`SettingsStorage`], the uniform contract callers
//! and decorators program against. A `module` argument of `None` always means
//! the backend's default module ([`DEFAULT_MODULE`](crate::settings::DEFAULT_MODULE)).
//!
//! Backends:
//! - [`MemorySettingsStorage`] - in-process only
//! - [`FileSettingsStorage`] - one JSON/INI/YAML/TOML file
//! - [`WebStorageSettingsStorage`] - a `localStorage`-like string area
//! - [`IndexedDbSettingsStorage`] - a versioned object-store database
//! - [`CacheSettingsStorage`] - a request/response cache
//! - [`MongoDbSettingsStorage`] - a document collection
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::settings::{SettingsValue, StoreValue, Value};

pub mod cache;
pub mod file;
pub mod indexed_db;
pub mod memory;
pub mod mongodb;
pub mod read_write;
pub mod web;

pub use cache::{CacheSettingsStorage, CacheStorage, MemoryCacheStorage, RequestCache};
pub use file::{FileSettingsStorage, FileSource};
pub use indexed_db::{
    IndexedDbSettingsStorage, MemoryObjectDatabase, MemoryObjectDatabaseFactory, ObjectDatabase,
    ObjectDatabaseFactory,
};
pub use memory::{MemorySettingsStorage, MemorySource};
pub use mongodb::{MemoryCollection, MongoDbSettingsStorage, SettingsCollection, SettingsFilter};
pub use read_write::{ReadWriteSettingsStorage, SettingsSource};
pub use web::{MemoryStorageArea, StorageArea, WebStorageSettingsStorage};

/// Uniform module/key/value storage contract
#[async_trait]
pub trait SettingsStorage: Send + Sync + Debug {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    /// Remove one key
    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()>;

    /// Remove every key of one module
    async fn delete_all(&self, module: Option<&str>) -> Result<()>;

    /// Remove everything
    async fn delete_all_modules(&self) -> Result<()>;

    /// Stored value, or `default` when the key is absent or stored as null
    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value>;

    /// Every entry of one module
    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>>;

    /// Every entry of every module
    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>>;

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool>;

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()>;

    /// Store a batch of entries
    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()>;
}

#[async_trait]
impl<T: SettingsStorage + ?Sized> SettingsStorage for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        (**self).delete(key, module).await
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        (**self).delete_all(module).await
    }

    async fn delete_all_modules(&self) -> Result<()> {
        (**self).delete_all_modules().await
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        (**self).get(key, default, module).await
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        (**self).get_all(module).await
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        (**self).get_all_modules().await
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        (**self).has(key, module).await
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        (**self).store(key, value, module).await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        (**self).store_all(values).await
    }
}

#[cfg(test)]
mod tests;
