//! Module/key/value settings storage with interchangeable backends.
//!
//! Every backend implements [`SettingsStorage`]. Decorators in [`decorator`]
//! wrap a backend to change one aspect of it, and [`BackendSelector`] picks the
//! first backend that works in the current environment.
pub mod config;
pub mod decorator;
pub mod error;
pub mod flat;
pub mod format;
pub mod fs;
pub mod ini;
pub mod selector;
pub mod settings;
pub mod storage;

// Re-export the main types for the CLI and embedders
pub use config::{build_browser_storage, build_storage, StorageConfig, ValueEncoding};
pub use error::{Error, Result};
pub use flat::{FlatSettings, ModuleView};
pub use format::SettingsFormat;
pub use ini::IniCodec;
pub use selector::{BackendSelector, Candidate, LogSelectionLogger, SelectionEvent, SelectionLogger};
pub use settings::{Settings, SettingsValue, StoreValue, Value, DEFAULT_MODULE};
pub use storage::SettingsStorage;
