use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use crate::config::{build_browser_storage, build_storage, StorageConfig, ValueEncoding};
use crate::error::{Error, Result};
use crate::format::SettingsFormat;
use crate::selector::{BrowserEnvironment, LogSelectionLogger};
use crate::storage::{MemorySettingsStorage, MemoryStorageArea, SettingsStorage, StorageArea};

#[test]
fn test_parse_json_with_defaults() -> Result<()> {
    let config = StorageConfig::parse(
        r#"{"file_path": "settings.ini", "value_encoding": "default-value-type"}"#,
        SettingsFormat::Json,
    )?;

    assert_eq!(config.file_path, Some("settings.ini".into()));
    assert_eq!(config.value_encoding, ValueEncoding::DefaultValueType);
    assert_eq!(config.default_module, None);
    assert!(!config.session);
    Ok(())
}

#[cfg(feature = "toml-format")]
#[test]
fn test_parse_toml() -> Result<()> {
    let data = "format = \"ini\"\ndefault_module = \"app\"\nsession = true\n";
    let config = StorageConfig::parse(data, SettingsFormat::Toml)?;

    assert_eq!(config.format, Some(SettingsFormat::Ini));
    assert_eq!(config.default_module.as_deref(), Some("app"));
    assert!(config.session);
    Ok(())
}

#[cfg(feature = "yaml-format")]
#[test]
fn test_parse_yaml() -> Result<()> {
    let data = "key_prefix: app\nvalue_encoding: json\n";
    let config = StorageConfig::parse(data, SettingsFormat::Yaml)?;

    assert_eq!(config.key_prefix.as_deref(), Some("app"));
    assert_eq!(config.value_encoding, ValueEncoding::Json);
    Ok(())
}

#[test]
fn test_parse_rejects_ini_and_bad_text() {
    assert!(matches!(
        StorageConfig::parse("a=b", SettingsFormat::Ini),
        Err(Error::UnsupportedFormat(_))
    ));
    assert!(matches!(
        StorageConfig::parse("{\"session\": \"yes\"}", SettingsFormat::Json),
        Err(Error::Deserialization { .. })
    ));
    assert_eq!(
        StorageConfig::parse("  ", SettingsFormat::Json).ok(),
        Some(StorageConfig::default())
    );
}

#[test]
fn test_load_picks_format_from_extension() -> Result<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, r#"{"cache_name": "prefs"}"#).unwrap();

    let config = StorageConfig::load(&path)?;

    assert_eq!(config.cache_name.as_deref(), Some("prefs"));
    assert!(matches!(
        StorageConfig::load(&dir.path().join("storage.txt")),
        Err(Error::UnsupportedFormat(_))
    ));
    Ok(())
}

#[test]
fn test_value_encoding_names() -> Result<()> {
    for encoding in [
        ValueEncoding::Raw,
        ValueEncoding::Json,
        ValueEncoding::DefaultValueType,
    ] {
        assert_eq!(encoding.to_string().parse::<ValueEncoding>()?, encoding);
    }
    assert!("yaml".parse::<ValueEncoding>().is_err());
    Ok(())
}

#[tokio::test]
async fn test_decorate_applies_encoding_then_module() -> Result<()> {
    let inner = Arc::new(MemorySettingsStorage::default());
    let config = StorageConfig {
        default_module: Some("app".into()),
        value_encoding: ValueEncoding::Json,
        ..StorageConfig::default()
    };

    let storage = config.decorate(inner.clone());
    storage.store("size", json!([1, 2]), None).await?;

    assert_eq!(inner.get("size", json!(null), Some("app")).await?, json!("[1,2]"));
    assert_eq!(storage.get("size", json!(null), None).await?, json!([1, 2]));
    Ok(())
}

#[tokio::test]
async fn test_build_storage_uses_configured_file() -> Result<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.ini");
    let config = StorageConfig {
        file_path: Some(path.clone()),
        value_encoding: ValueEncoding::DefaultValueType,
        ..StorageConfig::default()
    };

    let storage = build_storage(&config, Arc::new(LogSelectionLogger)).await;
    storage.store("volume", json!(7), Some("audio")).await?;

    assert_eq!(storage.name(), "file");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[audio]\nvolume=7\n");
    assert_eq!(storage.get("volume", json!(0), Some("audio")).await?, json!(7.0));
    Ok(())
}

#[tokio::test]
async fn test_build_storage_without_file_is_memory() {
    let storage = build_storage(&StorageConfig::default(), Arc::new(LogSelectionLogger)).await;

    assert_eq!(storage.name(), "memory");
}

#[tokio::test]
async fn test_build_browser_storage_takes_prefix_from_config() -> Result<()> {
    let area = Arc::new(MemoryStorageArea::new());
    let config = StorageConfig {
        key_prefix: Some("prefs".into()),
        ..StorageConfig::default()
    };
    let environment = BrowserEnvironment {
        local_storage: Some(area.clone()),
        ..BrowserEnvironment::default()
    };

    let storage = build_browser_storage(&config, environment, Arc::new(LogSelectionLogger)).await;
    storage.store("theme", json!("dark"), None).await?;

    assert_eq!(
        area.get_item("prefs____default____theme").await?,
        Some("dark".to_string())
    );
    Ok(())
}
