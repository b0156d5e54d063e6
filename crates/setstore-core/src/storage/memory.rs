use async_trait::async_trait;

use crate::error::Result;
use crate::settings::Settings;
use crate::storage::read_write::{ReadWriteSettingsStorage, SettingsSource};

/// Source that starts from a fixed document and never persists anything
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    initial: Settings,
}

impl MemorySource {
    pub fn new(initial: Settings) -> Self {
        Self { initial }
    }
}

#[async_trait]
impl SettingsSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self) -> Result<Settings> {
        Ok(self.initial.clone())
    }

    async fn write(&self, _settings: &Settings) -> Result<()> {
        Ok(())
    }
}

/// In-process storage; lost when the process exits
pub type MemorySettingsStorage = ReadWriteSettingsStorage<MemorySource>;
