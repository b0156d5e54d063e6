use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use setstore_core::{Error, Result, SettingsFormat, StorageConfig, Value, ValueEncoding};

/// Setstore: read and write module/key/value settings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Storage configuration file (JSON, YAML or TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Settings file; without one, settings live in memory only
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Format of the settings file (ini, json, yaml, toml); defaults to its extension
    #[arg(long)]
    pub format: Option<SettingsFormat>,

    /// Module used by every command
    #[arg(long)]
    pub module: Option<String>,

    /// Value encoding (raw, json, default-value-type)
    #[arg(long)]
    pub encoding: Option<ValueEncoding>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a value
    Get {
        key: String,
        /// Printed when the key is absent; JSON when it parses as JSON
        #[arg(long)]
        default: Option<String>,
    },
    /// Store a value
    Store {
        key: String,
        value: String,
        /// Parse the value as JSON instead of storing it as a string
        #[arg(long)]
        json: bool,
    },
    /// Remove a key
    Delete { key: String },
    /// Print whether a key is stored
    Has { key: String },
    /// List stored entries
    List {
        /// List every module instead of one
        #[arg(long)]
        all_modules: bool,
    },
    /// Remove stored entries
    Clear {
        /// Clear every module instead of one
        #[arg(long)]
        all_modules: bool,
    },
    /// Print every module in another format
    Export {
        #[arg(long)]
        format: SettingsFormat,
    },
}

impl CliArgs {
    /// Configuration file, then command-line overrides
    pub fn storage_config(&self) -> Result<StorageConfig> {
        let mut config = match &self.config {
            Some(path) => StorageConfig::load(path)?,
            None => StorageConfig::default(),
        };

        if let Some(file) = &self.file {
            config.file_path = Some(file.clone());
        }
        if let Some(format) = self.format {
            config.format = Some(format);
        }
        if let Some(module) = &self.module {
            config.default_module = Some(module.clone());
        }
        if let Some(encoding) = self.encoding {
            config.value_encoding = encoding;
        }
        Ok(config)
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Value given on the command line
pub fn parse_value(text: &str, json: bool) -> Result<Value> {
    if json {
        serde_json::from_str(text).map_err(|e| Error::deserialization("json", e))
    } else {
        Ok(Value::String(text.to_string()))
    }
}

/// Default given on the command line: JSON when it parses, a string otherwise
pub fn parse_default(text: Option<&str>) -> Value {
    match text {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        None => Value::Null,
    }
}
