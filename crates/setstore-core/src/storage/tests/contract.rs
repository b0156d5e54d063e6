//! Behaviour every backend shares. Values are strings so text-only backends
//! pass the same checks.
use serde_json::json;

use crate::error::Result;
use crate::settings::{SettingsValue, StoreValue, DEFAULT_MODULE};
use crate::storage::SettingsStorage;

fn sorted(mut values: Vec<SettingsValue>) -> Vec<SettingsValue> {
    values.sort_by(|a, b| (&a.module, &a.key).cmp(&(&b.module, &b.key)));
    values
}

pub async fn check_store_and_get(storage: &dyn SettingsStorage) -> Result<()> {
    assert!(!storage.has("theme", None).await?);
    assert_eq!(storage.get("theme", json!("light"), None).await?, json!("light"));

    storage.store("theme", json!("dark"), None).await?;

    assert!(storage.has("theme", None).await?);
    assert_eq!(storage.get("theme", json!("light"), None).await?, json!("dark"));
    assert!(storage.has("theme", Some(DEFAULT_MODULE)).await?);

    storage.store("theme", json!("solarized"), None).await?;
    assert_eq!(storage.get("theme", json!(null), None).await?, json!("solarized"));
    Ok(())
}

pub async fn check_modules_are_isolated(storage: &dyn SettingsStorage) -> Result<()> {
    storage.store("size", json!("10"), None).await?;
    storage.store("size", json!("12"), Some("editor")).await?;
    storage.store("size", json!("14"), Some("")).await?;

    assert_eq!(storage.get("size", json!(null), None).await?, json!("10"));
    assert_eq!(storage.get("size", json!(null), Some("editor")).await?, json!("12"));
    assert_eq!(storage.get("size", json!(null), Some("")).await?, json!("14"));
    assert!(!storage.has("size", Some("terminal")).await?);

    assert_eq!(
        storage.get_all(Some("editor")).await?,
        vec![SettingsValue::new("editor", "size", json!("12"))]
    );
    assert_eq!(
        storage.get_all(None).await?,
        vec![SettingsValue::new(DEFAULT_MODULE, "size", json!("10"))]
    );
    Ok(())
}

pub async fn check_delete(storage: &dyn SettingsStorage) -> Result<()> {
    storage.store("a", json!("1"), Some("m")).await?;
    storage.store("b", json!("2"), Some("m")).await?;

    storage.delete("a", Some("m")).await?;
    storage.delete("never-stored", Some("m")).await?;

    assert!(!storage.has("a", Some("m")).await?);
    assert!(storage.has("b", Some("m")).await?);
    assert_eq!(storage.get("a", json!("gone"), Some("m")).await?, json!("gone"));
    Ok(())
}

pub async fn check_delete_all(storage: &dyn SettingsStorage) -> Result<()> {
    storage.store("a", json!("1"), Some("m")).await?;
    storage.store("b", json!("2"), Some("m")).await?;
    storage.store("a", json!("3"), None).await?;

    storage.delete_all(Some("m")).await?;

    assert!(storage.get_all(Some("m")).await?.is_empty());
    assert_eq!(storage.get("a", json!(null), None).await?, json!("3"));

    storage.delete_all(None).await?;
    assert!(!storage.has("a", None).await?);
    Ok(())
}

pub async fn check_delete_all_modules(storage: &dyn SettingsStorage) -> Result<()> {
    storage.store("a", json!("1"), Some("m")).await?;
    storage.store("b", json!("2"), None).await?;

    storage.delete_all_modules().await?;

    assert!(storage.get_all_modules().await?.is_empty());
    assert!(!storage.has("a", Some("m")).await?);

    // Still usable afterwards
    storage.store("c", json!("3"), None).await?;
    assert_eq!(storage.get("c", json!(null), None).await?, json!("3"));
    Ok(())
}

pub async fn check_store_all(storage: &dyn SettingsStorage) -> Result<()> {
    storage
        .store_all(vec![
            StoreValue::new("a", json!("1")),
            StoreValue::in_module("net", "port", json!("80")),
            StoreValue::in_module("net", "host", json!("localhost")),
        ])
        .await?;
    storage.store_all(Vec::new()).await?;

    assert_eq!(
        sorted(storage.get_all_modules().await?),
        vec![
            SettingsValue::new(DEFAULT_MODULE, "a", json!("1")),
            SettingsValue::new("net", "host", json!("localhost")),
            SettingsValue::new("net", "port", json!("80")),
        ]
    );
    Ok(())
}

/// Run every check, clearing the storage in between
pub async fn check_all(storage: &dyn SettingsStorage) -> Result<()> {
    check_store_and_get(storage).await?;
    storage.delete_all_modules().await?;
    check_modules_are_isolated(storage).await?;
    storage.delete_all_modules().await?;
    check_delete(storage).await?;
    storage.delete_all_modules().await?;
    check_delete_all(storage).await?;
    storage.delete_all_modules().await?;
    check_delete_all_modules(storage).await?;
    storage.delete_all_modules().await?;
    check_store_all(storage).await?;
    Ok(())
}
