use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock};
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::settings::{module_or_default, SettingsValue, StoreValue, Value};
use crate::storage::SettingsStorage;

const MODULE_QUERY_PARAM: &str = "module";
const KEY_QUERY_PARAM: &str = "key";

/// Named request/response caches, like the browser `CacheStorage`
#[async_trait]
pub trait CacheStorage: Send + Sync + Debug {
    /// Open a cache, creating it when missing
    async fn open(&self, name: &str) -> Result<Arc<dyn RequestCache>>;

    /// Drop a cache and everything in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// One cache of request URL → response body
#[async_trait]
pub trait RequestCache: Send + Sync + Debug {
    async fn match_url(&self, url: &str) -> Result<Option<String>>;

    async fn put(&self, url: &str, body: String) -> Result<()>;

    async fn delete(&self, url: &str) -> Result<bool>;

    /// Every cached request URL
    async fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct MemoryRequestCache {
    responses: RwLock<IndexMap<String, String>>,
}

#[async_trait]
impl RequestCache for MemoryRequestCache {
    async fn match_url(&self, url: &str) -> Result<Option<String>> {
        Ok(self.responses.read().await.get(url).cloned())
    }

    async fn put(&self, url: &str, body: String) -> Result<()> {
        self.responses.write().await.insert(url.to_string(), body);
        Ok(())
    }

    async fn delete(&self, url: &str) -> Result<bool> {
        Ok(self.responses.write().await.shift_remove(url).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.responses.read().await.keys().cloned().collect())
    }
}

/// Cache storage held in process memory
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: Mutex<IndexMap<String, Arc<MemoryRequestCache>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn RequestCache>> {
        let cache = self
            .caches
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .clone();
        Ok(cache)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.caches.lock().await.shift_remove(name).is_some())
    }
}

/// Storage keeping each entry as a cached response at
/// `/?module=<module>&key=<key>` whose body is the value's JSON text
#[derive(Debug)]
pub struct CacheSettingsStorage {
    caches: Arc<dyn CacheStorage>,
    cache_name: String,
    cache: Mutex<Option<Arc<dyn RequestCache>>>,
}

impl CacheSettingsStorage {
    /// Open the named cache
    pub async fn open(caches: Arc<dyn CacheStorage>, cache_name: impl Into<String>) -> Result<Self> {
        let storage = Self {
            caches,
            cache_name: cache_name.into(),
            cache: Mutex::new(None),
        };
        storage.cache().await?;
        Ok(storage)
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    async fn cache(&self) -> Result<Arc<dyn RequestCache>> {
        let mut cache = self.cache.lock().await;
        if let Some(cache) = cache.as_ref() {
            return Ok(cache.clone());
        }

        let opened = self.caches.open(&self.cache_name).await?;
        *cache = Some(opened.clone());
        Ok(opened)
    }

    async fn entries(&self, module: Option<&str>) -> Result<Vec<(String, SettingsValue)>> {
        let cache = self.cache().await?;
        let mut values = Vec::new();
        for url in cache.keys().await? {
            let Some((entry_module, key)) = parse_url(&url) else {
                continue;
            };
            if module.is_some_and(|module| module != entry_module) {
                continue;
            }
            let Some(body) = cache.match_url(&url).await? else {
                continue;
            };
            let entry = SettingsValue::new(entry_module, key, parse_body(&body)?);
            values.push((url, entry));
        }
        Ok(values)
    }
}

fn entry_url(key: &str, module: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(MODULE_QUERY_PARAM, module)
        .append_pair(KEY_QUERY_PARAM, key)
        .finish();
    format!("/?{query}")
}

/// (module, key) encoded in an entry URL
fn parse_url(url: &str) -> Option<(String, String)> {
    let (_, query) = url.split_once('?')?;
    let mut module = None;
    let mut key = None;
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        match &*name {
            MODULE_QUERY_PARAM => module = Some(value.into_owned()),
            KEY_QUERY_PARAM => key = Some(value.into_owned()),
            _ => {}
        }
    }
    Some((module?, key?))
}

fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::deserialization("json", e))
}

#[async_trait]
impl SettingsStorage for CacheSettingsStorage {
    fn name(&self) -> &str {
        "cache"
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        let url = entry_url(key, module_or_default(module));
        self.cache().await?.delete(&url).await.map(|_| ())
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        let cache = self.cache().await?;
        for (url, _) in self.entries(Some(module_or_default(module))).await? {
            cache.delete(&url).await?;
        }
        Ok(())
    }

    async fn delete_all_modules(&self) -> Result<()> {
        let mut cache = self.cache.lock().await;
        *cache = None;
        self.caches.delete(&self.cache_name).await?;
        *cache = Some(self.caches.open(&self.cache_name).await?);
        Ok(())
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        let url = entry_url(key, module_or_default(module));
        let value = match self.cache().await?.match_url(&url).await? {
            Some(body) => parse_body(&body)?,
            None => Value::Null,
        };
        Ok(if value.is_null() { default } else { value })
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
        let url = entry_url(key, module_or_default(module));
        Ok(self.cache().await?.match_url(&url).await?.is_some())
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        let url = entry_url(key, module_or_default(module));
        let body = serde_json::to_string(&value).map_err(|e| Error::serialization("json", e))?;
        self.cache().await?.put(&url, body).await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        for value in values {
            self.store(&value.key, value.value, value.module.as_deref())
                .await?;
        }
        Ok(())
    }
}
