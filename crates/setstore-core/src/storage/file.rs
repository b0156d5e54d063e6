use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::error::{Error, Result};
use crate::format::SettingsFormat;
use crate::fs::{LocalStorageProvider, StorageProvider};
use crate::settings::Settings;
use crate::storage::read_write::{ReadWriteSettingsStorage, SettingsSource};

/// One settings file in a fixed format
#[derive(Debug, Clone)]
pub struct FileSource {
    provider: Arc<dyn StorageProvider>,
    path: PathBuf,
    format: SettingsFormat,
}

impl FileSource {
    /// File on the local filesystem, relative paths resolved against the working directory
    pub fn new(path: impl Into<PathBuf>, format: SettingsFormat) -> Self {
        Self::with_provider(Arc::new(LocalStorageProvider::current_dir()), path, format)
    }

    /// Local file whose format follows its extension
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = SettingsFormat::from_path(&path).ok_or_else(|| {
            Error::UnsupportedFormat(format!("no known format for path {}", path.display()))
        })?;
        Ok(Self::new(path, format))
    }

    pub fn with_provider(
        provider: Arc<dyn StorageProvider>,
        path: impl Into<PathBuf>,
        format: SettingsFormat,
    ) -> Self {
        Self {
            provider,
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SettingsFormat {
        self.format
    }
}

#[async_trait]
impl SettingsSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn read(&self) -> Result<Settings> {
        // A file that was never written is an empty document
        if !self.provider.exists(&self.path) {
            debug!(
                "Settings file {} does not exist yet on '{}'",
                self.path.display(),
                self.provider.name()
            );
            return Ok(Settings::new());
        }

        let content = self.provider.read_to_string(&self.path)?;
        self.format.deserialize(&content)
    }

    async fn write(&self, settings: &Settings) -> Result<()> {
        let content = self.format.serialize(settings)?;
        self.provider.write_string(&self.path, &content)
    }
}

/// Storage persisted to a single JSON, INI, YAML or TOML file
pub type FileSettingsStorage = ReadWriteSettingsStorage<FileSource>;
