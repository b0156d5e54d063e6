//! Settings document types shared by every backend.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Arbitrary serializable settings value. `Value::Null` means "absent".
pub use serde_json::Value;

/// Module used whenever a caller does not name one.
pub const DEFAULT_MODULE: &str = "default";

/// Keys of one module, in insertion order
pub type ModuleSettings = IndexMap<String, Value>;

/// Whole settings document: module → key → value
pub type Settings = IndexMap<String, ModuleSettings>;

/// One stored entry as returned by `get_all` / `get_all_modules`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsValue {
    pub module: String,
    pub key: String,
    pub value: Value,
}

impl SettingsValue {
    pub fn new(module: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            module: module.into(),
            key: key.into(),
            value,
        }
    }
}

/// One entry of a batched `store_all` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub key: String,
    pub value: Value,
}

impl StoreValue {
    /// Entry for the default module
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            module: None,
            key: key.into(),
            value,
        }
    }

    /// Entry for an explicit module
    pub fn in_module(module: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            module: Some(module.into()),
            key: key.into(),
            value,
        }
    }
}

/// Resolve an optional module name to the name actually stored.
pub fn module_or_default(module: Option<&str>) -> &str {
    module.unwrap_or(DEFAULT_MODULE)
}

/// Flatten a document into entries, module by module.
pub fn entries(settings: &Settings) -> Vec<SettingsValue> {
    settings
        .iter()
        .flat_map(|(module, keys)| {
            keys.iter()
                .map(move |(key, value)| SettingsValue::new(module.clone(), key.clone(), value.clone()))
        })
        .collect()
}

/// Group entries back into a document, keeping first-seen module order.
pub fn from_entries(values: impl IntoIterator<Item = SettingsValue>) -> Settings {
    let mut settings = Settings::new();
    for value in values {
        settings
            .entry(value.module)
            .or_default()
            .insert(value.key, value.value);
    }
    settings
}

/// Text form of a value for string-only stores: strings verbatim, anything
/// else as its JSON text.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_entries_and_back() {
        let values = vec![
            SettingsValue::new("ui", "theme", json!("dark")),
            SettingsValue::new(DEFAULT_MODULE, "lang", json!("en")),
            SettingsValue::new("ui", "size", json!(12)),
        ];

        let settings = from_entries(values);

        assert_eq!(settings.keys().collect::<Vec<_>>(), vec!["ui", DEFAULT_MODULE]);
        assert_eq!(settings["ui"]["size"], json!(12));
        assert_eq!(entries(&settings).len(), 3);
        assert_eq!(entries(&settings)[1], SettingsValue::new("ui", "size", json!(12)));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text(&json!("a \"b\"")), "a \"b\"");
        assert_eq!(plain_text(&json!(true)), "true");
        assert_eq!(plain_text(&json!({"a": [1]})), "{\"a\":[1]}");
        assert_eq!(module_or_default(None), DEFAULT_MODULE);
        assert_eq!(module_or_default(Some("")), "");
    }
}
