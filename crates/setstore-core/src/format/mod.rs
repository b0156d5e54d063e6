use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ini::{IniCodec, IniDocument, IniModule};
use crate::settings::{plain_text, Settings, Value};

/// Text formats a settings document can be persisted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsFormat {
    /// JSON format (.json)
    Json,
    /// INI format (.ini); every value reads back as a string
    Ini,
    /// YAML format (.yaml, .yml) - requires "yaml-format" feature
    #[cfg(feature = "yaml-format")]
    Yaml,
    /// TOML format (.toml) - requires "toml-format" feature
    #[cfg(feature = "toml-format")]
    Toml,
}

impl SettingsFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SettingsFormat::Json => "json",
            SettingsFormat::Ini => "ini",
            #[cfg(feature = "yaml-format")]
            SettingsFormat::Yaml => "yaml",
            #[cfg(feature = "toml-format")]
            SettingsFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Serialize a settings document
    pub fn serialize(&self, settings: &Settings) -> Result<String> {
        match self {
            SettingsFormat::Json => serde_json::to_string_pretty(settings)
                .map_err(|e| Error::serialization("json", e)),
            SettingsFormat::Ini => Ok(IniCodec::default().stringify(&to_ini(settings))),
            #[cfg(feature = "yaml-format")]
            SettingsFormat::Yaml => {
                serde_yaml::to_string(settings).map_err(|e| Error::serialization("yaml", e))
            }
            #[cfg(feature = "toml-format")]
            SettingsFormat::Toml => {
                toml::to_string_pretty(settings).map_err(|e| Error::serialization("toml", e))
            }
        }
    }

    /// Deserialize a settings document. Blank text is an empty document.
    pub fn deserialize(&self, data: &str) -> Result<Settings> {
        if data.trim().is_empty() {
            return Ok(Settings::new());
        }

        match self {
            SettingsFormat::Json => {
                serde_json::from_str(data).map_err(|e| Error::deserialization("json", e))
            }
            SettingsFormat::Ini => Ok(from_ini(IniCodec::default().parse(data))),
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
}

impl FromStr for SettingsFormat {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "json" => Ok(SettingsFormat::Json),
            "ini" => Ok(SettingsFormat::Ini),
            #[cfg(feature = "yaml-format")]
            "yaml" | "yml" => Ok(SettingsFormat::Yaml),
            #[cfg(feature = "toml-format")]
            "toml" => Ok(SettingsFormat::Toml),
            _ => Err(Error::UnsupportedFormat(name.to_string())),
        }
    }
}

impl fmt::Display for SettingsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// Null values are absent and are not written.
fn to_ini(settings: &Settings) -> IniDocument {
    settings
        .iter()
        .map(|(module, keys)| {
            let fields: IniModule = keys
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.clone(), plain_text(value)))
                .collect();
            (module.clone(), fields)
        })
        .collect()
}

fn from_ini(document: IniDocument) -> Settings {
    document
        .into_iter()
        .map(|(module, keys)| {
            let values = keys
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            (module, values)
        })
        .collect()
}
