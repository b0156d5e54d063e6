use std::fmt::Debug;

use async_trait::async_trait;
use log::debug;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::settings::{
    entries, module_or_default, Settings, SettingsValue, StoreValue, Value,
};
use crate::storage::SettingsStorage;

/// Where a [`ReadWriteSettingsStorage`] loads its document from and flushes it to
#[async_trait]
pub trait SettingsSource: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Read the whole document
    async fn read(&self) -> Result<Settings>;

    /// Replace the whole document
    async fn write(&self, settings: &Settings) -> Result<()>;
}

/// Storage that keeps the whole document in memory and writes all of it back
/// to its source after every mutation.
///
/// The document is loaded on first access, or eagerly through [`init`](Self::init).
#[derive(Debug)]
pub struct ReadWriteSettingsStorage<S> {
    source: S,
    settings: Mutex<Option<Settings>>,
}

impl<S: SettingsSource> ReadWriteSettingsStorage<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            settings: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load the document now instead of on first access
    pub async fn init(&self) -> Result<()> {
        self.loaded().await.map(|_| ())
    }

    /// Copy of the current document
    pub async fn settings(&self) -> Result<Settings> {
        let mut guard = self.loaded().await?;
        Ok(document(&mut guard).clone())
    }

    async fn loaded(&self) -> Result<MutexGuard<'_, Option<Settings>>> {
        let mut guard = self.settings.lock().await;
        if guard.is_none() {
            let settings = self.source.read().await?;
            debug!(
                "Loaded {} module(s) from '{}'",
                settings.len(),
                self.source.name()
            );
            *guard = Some(settings);
        }
        Ok(guard)
    }

    /// Apply `change` and flush the result
    async fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Settings) + Send,
    {
        let mut guard = self.loaded().await?;
        let settings = document(&mut guard);
        change(settings);
        self.flush(settings).await
    }

    async fn flush(&self, settings: &Settings) -> Result<()> {
        debug!("Flushing settings to '{}'", self.source.name());
        self.source.write(settings).await
    }
}

impl<S: SettingsSource + Default> Default for ReadWriteSettingsStorage<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

fn document(guard: &mut Option<Settings>) -> &mut Settings {
    guard.get_or_insert_with(Settings::new)
}

fn insert(settings: &mut Settings, module: &str, key: &str, value: Value) {
    settings
        .entry(module.to_string())
        .or_default()
        .insert(key.to_string(), value);
}

#[async_trait]
impl<S: SettingsSource> SettingsStorage for ReadWriteSettingsStorage<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        let module = module_or_default(module);
        self.mutate(|settings| {
            if let Some(keys) = settings.get_mut(module) {
                keys.shift_remove(key);
                if keys.is_empty() {
                    settings.shift_remove(module);
                }
            }
        })
        .await
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        let module = module_or_default(module);
        self.mutate(|settings| {
            settings.shift_remove(module);
        })
        .await
    }

    async fn delete_all_modules(&self) -> Result<()> {
        self.mutate(|settings| settings.clear()).await
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        let mut guard = self.loaded().await?;
        let value = document(&mut guard)
            .get(module_or_default(module))
            .and_then(|keys| keys.get(key))
            .filter(|value| !value.is_null())
            .cloned();
        Ok(value.unwrap_or(default))
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        let module = module_or_default(module);
        let mut guard = self.loaded().await?;
        let values = document(&mut guard)
            .get(module)
            .map(|keys| {
                keys.iter()
                    .map(|(key, value)| SettingsValue::new(module, key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(values)
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        let mut guard = self.loaded().await?;
        Ok(entries(document(&mut guard)))
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        let mut guard = self.loaded().await?;
        Ok(document(&mut guard)
            .get(module_or_default(module))
            .is_some_and(|keys| keys.contains_key(key)))
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        let module = module_or_default(module);
        self.mutate(|settings| insert(settings, module, key, value))
            .await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        self.mutate(|settings| {
            for value in values {
                insert(
                    settings,
                    module_or_default(value.module.as_deref()),
                    &value.key,
                    value.value,
                );
            }
        })
        .await
    }
}
