use std::fmt;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::settings::{plain_text, SettingsValue, StoreValue, Value};
use crate::storage::SettingsStorage;

/// Turns a value into the text handed to the inner storage
pub type Encoder = Box<dyn Fn(&Value) -> Result<String> + Send + Sync>;

/// Turns stored text back into a value; `None` falls back to the caller's default
pub type Decoder = Box<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Encodes every written value to text and decodes every read one.
///
/// Null or absent stored values short-circuit to the caller's default without
/// reaching the decoder.
pub struct StringifyValueSettingsStorage<S> {
    inner: S,
    encode: Encoder,
    decode: Decoder,
}

impl<S: SettingsStorage> StringifyValueSettingsStorage<S> {
    pub fn new(inner: S, encode: Encoder, decode: Decoder) -> Self {
        Self {
            inner,
            encode,
            decode,
        }
    }

    /// Values stored as JSON text
    pub fn json(inner: S) -> Self {
        Self::new(
            inner,
            Box::new(|value: &Value| {
                serde_json::to_string(value).map_err(|e| Error::serialization("json", e))
            }),
            Box::new(|text: &str| serde_json::from_str::<Value>(text).ok()),
        )
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn encode(&self, value: &Value) -> Result<Value> {
        (self.encode)(value).map(Value::String)
    }

    fn decode(&self, stored: Value) -> Option<Value> {
        if stored.is_null() {
            return None;
        }
        (self.decode)(&plain_text(&stored)).filter(|value| !value.is_null())
    }

    fn decode_entry(&self, entry: SettingsValue) -> SettingsValue {
        let value = self.decode(entry.value).unwrap_or(Value::Null);
        SettingsValue { value, ..entry }
    }
}

impl<S: fmt::Debug> fmt::Debug for StringifyValueSettingsStorage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringifyValueSettingsStorage")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: SettingsStorage> SettingsStorage for StringifyValueSettingsStorage<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn delete(&self, key: &str, module: Option<&str>) -> Result<()> {
        self.inner.delete(key, module).await
    }

    async fn delete_all(&self, module: Option<&str>) -> Result<()> {
        self.inner.delete_all(module).await
    }

    async fn delete_all_modules(&self) -> Result<()> {
        self.inner.delete_all_modules().await
    }

    async fn get(&self, key: &str, default: Value, module: Option<&str>) -> Result<Value> {
        let stored = self.inner.get(key, Value::Null, module).await?;
        Ok(self.decode(stored).unwrap_or(default))
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        let entries = self.inner.get_all(module).await?;
        Ok(entries.into_iter().map(|entry| self.decode_entry(entry)).collect())
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        let entries = self.inner.get_all_modules().await?;
        Ok(entries.into_iter().map(|entry| self.decode_entry(entry)).collect())
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        self.inner.has(key, module).await
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        let encoded = self.encode(&value)?;
        self.inner.store(key, encoded, module).await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        let values = values
            .into_iter()
            .map(|value| {
                Ok(StoreValue {
                    value: self.encode(&value.value)?,
                    ..value
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.inner.store_all(values).await
    }
}
