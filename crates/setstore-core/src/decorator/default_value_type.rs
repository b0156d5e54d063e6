use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Number;

use crate::error::Result;
use crate::settings::{plain_text, SettingsValue, StoreValue, Value};
use crate::storage::SettingsStorage;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("number pattern is a valid regex"));

const TRUE_WORDS: [&str; 3] = ["true", "yes", "1"];
const FALSE_WORDS: [&str; 3] = ["false", "no", "0"];

/// Coerce stored text to the type of `default`.
///
/// Boolean defaults accept `true`/`yes`/`1` and `false`/`no`/`0` in any case;
/// numeric defaults accept integer or decimal text that parses to a finite
/// number. Anything else, including values that are not text, comes back
/// unchanged.
pub fn coerce_to_default_type(value: Value, default: &Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };

    match default {
        Value::Bool(_) => {
            let lower = text.to_lowercase();
            if TRUE_WORDS.contains(&lower.as_str()) {
                Value::Bool(true)
            } else if FALSE_WORDS.contains(&lower.as_str()) {
                Value::Bool(false)
            } else {
                value
            }
        }
        Value::Number(_) if NUMBER_PATTERN.is_match(text) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(value),
        _ => value,
    }
}

/// Stores every value as plain text and coerces it back using the caller's default.
///
/// Strings are stored verbatim and everything else as its JSON text. Entries
/// returned by `get_all`/`get_all_modules` have no default to coerce to and
/// are passed through.
#[derive(Debug)]
pub struct DefaultValueTypeSettingsStorage<S> {
    inner: S,
}

impl<S: SettingsStorage> DefaultValueTypeSettingsStorage<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn to_text(value: Value) -> Value {
    match value {
        Value::Null | Value::String(_) => value,
        other => Value::String(plain_text(&other)),
    }
}

#[async_trait]
impl<S: SettingsStorage> SettingsStorage for DefaultValueTypeSettingsStorage<S> {
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
        if stored.is_null() {
            return Ok(default);
        }
        Ok(coerce_to_default_type(stored, &default))
    }

    async fn get_all(&self, module: Option<&str>) -> Result<Vec<SettingsValue>> {
        self.inner.get_all(module).await
    }

    async fn get_all_modules(&self) -> Result<Vec<SettingsValue>> {
        self.inner.get_all_modules().await
    }

    async fn has(&self, key: &str, module: Option<&str>) -> Result<bool> {
        self.inner.has(key, module).await
    }

    async fn store(&self, key: &str, value: Value, module: Option<&str>) -> Result<()> {
        self.inner.store(key, to_text(value), module).await
    }

    async fn store_all(&self, values: Vec<StoreValue>) -> Result<()> {
        let values = values
            .into_iter()
            .map(|value| StoreValue {
                value: to_text(value.value),
                ..value
            })
            .collect();
        self.inner.store_all(values).await
    }
}
