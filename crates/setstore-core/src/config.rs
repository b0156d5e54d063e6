//! # Storage Configuration
//!
//! [`StorageConfig`] describes which backend to select and how to decorate it.
//! It can be loaded from a JSON, YAML or TOML file; every field is optional.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decorator::{
    DefaultModuleSettingsStorage, DefaultValueTypeSettingsStorage, StringifyValueSettingsStorage,
};
use crate::error::{Error, Result};
use crate::format::SettingsFormat;
use crate::fs::{LocalStorageProvider, StorageProvider};
use crate::selector::{BackendSelector, BrowserEnvironment, SelectionLogger, ServerEnvironment};
use crate::storage::SettingsStorage;

/// How values are encoded before they reach the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueEncoding {
    /// Values are handed to the backend unchanged
    #[default]
    Raw,
    /// Values are stored as JSON text
    Json,
    /// Values are stored as plain text and coerced back to the type of the default
    DefaultValueType,
}

impl ValueEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueEncoding::Raw => "raw",
            ValueEncoding::Json => "json",
            ValueEncoding::DefaultValueType => "default-value-type",
        }
    }

    /// Wrap `storage` with the matching decorator
    pub fn wrap(&self, storage: Arc<dyn SettingsStorage>) -> Arc<dyn SettingsStorage> {
        match self {
            ValueEncoding::Raw => storage,
            ValueEncoding::Json => Arc::new(StringifyValueSettingsStorage::json(storage)),
            ValueEncoding::DefaultValueType => {
                Arc::new(DefaultValueTypeSettingsStorage::new(storage))
            }
        }
    }
}

impl FromStr for ValueEncoding {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "raw" => Ok(ValueEncoding::Raw),
            "json" => Ok(ValueEncoding::Json),
            "default-value-type" => Ok(ValueEncoding::DefaultValueType),
            _ => Err(Error::InvalidConfiguration(format!(
                "unknown value encoding '{name}'"
            ))),
        }
    }
}

impl fmt::Display for ValueEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend and decorator settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Settings file for the file backend
    pub file_path: Option<PathBuf>,
    /// Format of `file_path`; inferred from its extension when unset
    pub format: Option<SettingsFormat>,
    /// Module used when callers name none
    pub default_module: Option<String>,
    /// Web storage key prefix
    pub key_prefix: Option<String>,
    /// Use session storage instead of local storage
    pub session: bool,
    pub database_name: Option<String>,
    pub cache_name: Option<String>,
    pub value_encoding: ValueEncoding,
}

impl StorageConfig {
    /// Load a configuration file whose format follows its extension
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(&LocalStorageProvider::current_dir(), path)
    }

    pub fn load_with(provider: &dyn StorageProvider, path: &Path) -> Result<Self> {
        let format = SettingsFormat::from_path(path).ok_or_else(|| {
            Error::UnsupportedFormat(format!("no known format for path {}", path.display()))
        })?;
        let data = provider.read_to_string(path)?;
        Self::parse(&data, format)
    }

    /// Parse configuration text. INI has no typed values and is rejected.
    pub fn parse(data: &str, format: SettingsFormat) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        match format {
            SettingsFormat::Json => {
                serde_json::from_str(data).map_err(|e| Error::deserialization("json", e))
            }
            SettingsFormat::Ini => Err(Error::UnsupportedFormat(
                "ini cannot hold a storage configuration".to_string(),
            )),
            #[cfg(feature = "yaml-format")]
            SettingsFormat::Yaml => {
                serde_yaml::from_str(data).map_err(|e| Error::deserialization("yaml", e))
            }
            #[cfg(feature = "toml-format")]
            SettingsFormat::Toml => {
                toml::from_str(data).map_err(|e| Error::deserialization("toml", e))
            }
        }
    }

    /// Server chain inputs; no MongoDB collection is configured from a file
    pub fn server_environment(&self) -> ServerEnvironment {
        ServerEnvironment {
            collection: None,
            file_path: self.file_path.clone(),
            format: self.format,
        }
    }

    /// Fill the names in `environment` that this configuration sets
    pub fn browser_environment(&self, environment: BrowserEnvironment) -> BrowserEnvironment {
        BrowserEnvironment {
            database_name: self.database_name.clone().or(environment.database_name),
            cache_name: self.cache_name.clone().or(environment.cache_name),
            key_prefix: self.key_prefix.clone().or(environment.key_prefix),
            session: self.session || environment.session,
            ..environment
        }
    }

    /// Apply the value encoding, then the default module
    pub fn decorate(&self, storage: Arc<dyn SettingsStorage>) -> Arc<dyn SettingsStorage> {
        let storage = self.value_encoding.wrap(storage);
        match &self.default_module {
            Some(module) => Arc::new(DefaultModuleSettingsStorage::new(storage, module.clone())),
            None => storage,
        }
    }
}

/// Select a backend from the server chain and decorate it per `config`
pub async fn build_storage(
    config: &StorageConfig,
    logger: Arc<dyn SelectionLogger>,
) -> Arc<dyn SettingsStorage> {
    let storage = BackendSelector::server(logger, config.server_environment())
        .select()
        .await;
    config.decorate(storage)
}

/// Select a backend from the browser chain and decorate it per `config`
pub async fn build_browser_storage(
    config: &StorageConfig,
    environment: BrowserEnvironment,
    logger: Arc<dyn SelectionLogger>,
) -> Arc<dyn SettingsStorage> {
    let environment = config.browser_environment(environment);
    let storage = BackendSelector::browser(logger, environment).select().await;
    config.decorate(storage)
}

#[cfg(test)]
mod tests;
