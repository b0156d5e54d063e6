use std::sync::Arc;

use serde_json::json;

use crate::decorator::StringifyValueSettingsStorage;
use crate::error::Result;
use crate::settings::{SettingsValue, StoreValue, Value};
use crate::storage::{MemorySettingsStorage, SettingsStorage};

#[tokio::test]
async fn test_json_values_are_stored_as_text() -> Result<()> {
    let inner = Arc::new(MemorySettingsStorage::default());
    let storage = StringifyValueSettingsStorage::json(inner.clone());

    storage.store("window", json!({"width": 800}), None).await?;

    assert_eq!(
        inner.get("window", json!(null), None).await?,
        json!("{\"width\":800}")
    );
    assert_eq!(
        storage.get("window", json!(null), None).await?,
        json!({"width": 800})
    );
    Ok(())
}

#[tokio::test]
async fn test_absent_value_returns_default_without_decoding() -> Result<()> {
    let inner = Arc::new(MemorySettingsStorage::default());
    let storage = StringifyValueSettingsStorage::new(
        inner,
        Box::new(|value: &Value| Ok(value.to_string())),
        Box::new(|_: &str| -> Option<Value> {
            panic!("decoder must not run for absent values")
        }),
    );

    assert_eq!(storage.get("missing", json!(42), None).await?, json!(42));
    Ok(())
}

#[tokio::test]
async fn test_undecodable_value_returns_default() -> Result<()> {
    let inner = Arc::new(MemorySettingsStorage::default());
    inner.store("broken", json!("{not json"), None).await?;
    inner.store("null", json!("null"), None).await?;
    let storage = StringifyValueSettingsStorage::json(inner);

    assert_eq!(storage.get("broken", json!("fallback"), None).await?, json!("fallback"));
    assert_eq!(storage.get("null", json!("fallback"), None).await?, json!("fallback"));
    Ok(())
}

#[tokio::test]
async fn test_custom_codec() -> Result<()> {
    let inner = Arc::new(MemorySettingsStorage::default());
    let storage = StringifyValueSettingsStorage::new(
        inner.clone(),
        Box::new(|value: &Value| Ok(value.as_i64().unwrap_or_default().to_string())),
        Box::new(|text: &str| text.parse::<i64>().ok().map(|n| json!(n * 10))),
    );

    storage.store("n", json!(4), None).await?;

    assert_eq!(inner.get("n", json!(null), None).await?, json!("4"));
    assert_eq!(storage.get("n", json!(0), None).await?, json!(40));
    Ok(())
}

#[tokio::test]
async fn test_batch_and_listing_are_decoded() -> Result<()> {
    let inner = Arc::new(MemorySettingsStorage::default());
    let storage = StringifyValueSettingsStorage::json(inner.clone());

    storage
        .store_all(vec![
            StoreValue::new("flag", json!(true)),
            StoreValue::in_module("net", "ports", json!([80, 443])),
        ])
        .await?;
    inner.store("raw", json!("not json"), Some("net")).await?;

    assert_eq!(inner.get("flag", json!(null), None).await?, json!("true"));
    assert_eq!(
        storage.get_all(Some("net")).await?,
        vec![
            SettingsValue::new("net", "ports", json!([80, 443])),
            SettingsValue::new("net", "raw", json!(null)),
        ]
    );
    assert_eq!(storage.get_all_modules().await?.len(), 3);
    Ok(())
}
