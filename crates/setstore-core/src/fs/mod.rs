//! Filesystem access for file-backed settings storages.
pub mod error;
pub mod local;
pub mod provider;

pub use error::StorageSystemError;
pub use local::LocalStorageProvider;
pub use provider::StorageProvider;

#[cfg(test)]
mod tests;
