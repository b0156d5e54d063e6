//! # Backend Selection
//!
//! [`BackendSelector`] walks an ordered list of [`Candidate`] backends and
//! returns the first one that is available in the current environment and
//! initialises without error. Every skipped or failed candidate is reported
//! to a [`SelectionLogger`]. When nothing succeeds the selector falls back to
//! an in-memory storage, so selection itself never fails.
//!
//! [`BackendSelector::server`] and [`BackendSelector::browser`] build the two
//! standard chains from a [`ServerEnvironment`] / [`BrowserEnvironment`].
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::format::SettingsFormat;
use crate::settings::DEFAULT_MODULE;
use crate::storage::{
    CacheSettingsStorage, CacheStorage, FileSettingsStorage, FileSource, IndexedDbSettingsStorage,
    MemorySettingsStorage, MongoDbSettingsStorage, ObjectDatabaseFactory, SettingsCollection,
    SettingsFilter, SettingsStorage, StorageArea, WebStorageSettingsStorage,
};

/// Future resolving to an initialised backend
pub type StorageFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn SettingsStorage>>> + Send>>;

/// One backend the selector may pick
pub struct Candidate {
    name: String,
    available: Box<dyn Fn() -> bool + Send + Sync>,
    factory: Box<dyn FnOnce() -> StorageFuture + Send>,
    warning: Option<String>,
}

impl Candidate {
    /// `available` is checked first; `factory` only runs for available candidates
    /// and must finish all initialisation before resolving.
    pub fn new<A, F, Fut>(name: impl Into<String>, available: A, factory: F) -> Self
    where
        A: Fn() -> bool + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Arc<dyn SettingsStorage>>> + Send + 'static,
    {
        Self {
            name: name.into(),
            available: Box::new(available),
            factory: Box::new(move || Box::pin(factory())),
            warning: None,
        }
    }

    /// Warning reported when this candidate ends up selected
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_available(&self) -> bool {
        (self.available)()
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("warning", &self.warning)
            .finish_non_exhaustive()
    }
}

/// A step away from the preferred backend, or a caveat of the chosen one
#[derive(Debug)]
pub enum SelectionEvent<'a> {
    /// The candidate does not apply to this environment
    Unavailable { backend: &'a str },
    /// The candidate applied but could not be initialised
    Failed { backend: &'a str, error: &'a Error },
    /// The selected backend works with caveats
    Warning { backend: &'a str, message: &'a str },
    /// Nothing succeeded; settings will not persist
    MemoryFallback,
}

/// Receives selection events
pub trait SelectionLogger: Send + Sync {
    fn log(&self, event: &SelectionEvent<'_>);
}

/// Forwards selection events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSelectionLogger;

impl SelectionLogger for LogSelectionLogger {
    fn log(&self, event: &SelectionEvent<'_>) {
        match event {
            SelectionEvent::Unavailable { backend } => {
                log::info!("Settings backend '{}' is not available", backend)
            }
            SelectionEvent::Failed { backend, error } => {
                log::error!("Settings backend '{}' failed to initialise: {}", backend, error)
            }
            SelectionEvent::Warning { backend, message } => {
                log::warn!("Settings backend '{}': {}", backend, message)
            }
            SelectionEvent::MemoryFallback => {
                log::warn!("No settings backend available, falling back to memory; settings will not persist")
            }
        }
    }
}

/// Tries candidates in order and returns the first that initialises
pub struct BackendSelector {
    logger: Arc<dyn SelectionLogger>,
    candidates: Vec<Candidate>,
}

impl BackendSelector {
    pub fn new(logger: Arc<dyn SelectionLogger>) -> Self {
        Self {
            logger,
            candidates: Vec::new(),
        }
    }

    /// Append a candidate to the chain
    pub fn candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// MongoDB, then file, then memory
    pub fn server(logger: Arc<dyn SelectionLogger>, environment: ServerEnvironment) -> Self {
        let ServerEnvironment {
            collection,
            file_path,
            format,
        } = environment;

        let has_collection = collection.is_some();
        let has_file = file_path.is_some();

        Self::new(logger)
            .candidate(Candidate::new(
                "mongodb",
                move || has_collection,
                move || open_mongodb(collection),
            ))
            .candidate(Candidate::new(
                "file",
                move || has_file,
                move || open_file(file_path, format),
            ))
    }

    /// IndexedDB, then Cache API, then web storage, then memory
    pub fn browser(logger: Arc<dyn SelectionLogger>, environment: BrowserEnvironment) -> Self {
        let BrowserEnvironment {
            databases,
            database_name,
            caches,
            cache_name,
            local_storage,
            session_storage,
            session,
            key_prefix,
        } = environment;

        let has_database = databases.is_some() && database_name.is_some();
        let has_cache = caches.is_some() && cache_name.is_some();
        let area = if session { session_storage } else { local_storage };
        let has_area = area.is_some() && key_prefix.is_some();

        Self::new(logger)
            .candidate(Candidate::new(
                "indexeddb",
                move || has_database,
                move || open_indexed_db(databases, database_name),
            ))
            .candidate(Candidate::new(
                "cache",
                move || has_cache,
                move || open_cache(caches, cache_name),
            ))
            .candidate(
                Candidate::new(
                    "web-storage",
                    move || has_area,
                    move || open_web_storage(area, key_prefix),
                )
                .with_warning("web storage has a small quota; large settings may not fit"),
            )
    }

    /// Never fails; falls back to an in-memory storage
    pub async fn select(self) -> Arc<dyn SettingsStorage> {
        let logger = self.logger;

        for candidate in self.candidates {
            if !candidate.is_available() {
                logger.log(&SelectionEvent::Unavailable {
                    backend: &candidate.name,
                });
                continue;
            }

            match (candidate.factory)().await {
                Ok(storage) => {
                    log::debug!("Using settings backend '{}'", candidate.name);
                    if let Some(message) = &candidate.warning {
                        logger.log(&SelectionEvent::Warning {
                            backend: &candidate.name,
                            message,
                        });
                    }
                    return storage;
                }
                Err(error) => logger.log(&SelectionEvent::Failed {
                    backend: &candidate.name,
                    error: &error,
                }),
            }
        }

        logger.log(&SelectionEvent::MemoryFallback);
        let fallback = MemorySettingsStorage::default();
        if let Err(error) = fallback.init().await {
            logger.log(&SelectionEvent::Failed {
                backend: "memory",
                error: &error,
            });
        }
        Arc::new(fallback)
    }
}

async fn open_mongodb(
    collection: Option<Arc<dyn SettingsCollection>>,
) -> Result<Arc<dyn SettingsStorage>> {
    let collection = collection.ok_or_else(|| Error::Unavailable("mongodb".into()))?;
    // Round trip before handing the collection out
    collection.find_one(&SettingsFilter::all()).await?;
    Ok(Arc::new(MongoDbSettingsStorage::new(collection)))
}

async fn open_file(
    path: Option<PathBuf>,
    format: Option<SettingsFormat>,
) -> Result<Arc<dyn SettingsStorage>> {
    let path = path.ok_or_else(|| Error::Unavailable("file".into()))?;
    let source = match format {
        Some(format) => FileSource::new(path, format),
        None => FileSource::from_path(path)?,
    };
    let storage = FileSettingsStorage::new(source);
    storage.init().await?;
    Ok(Arc::new(storage))
}

async fn open_indexed_db(
    databases: Option<Arc<dyn ObjectDatabaseFactory>>,
    name: Option<String>,
) -> Result<Arc<dyn SettingsStorage>> {
    let (Some(databases), Some(name)) = (databases, name) else {
        return Err(Error::Unavailable("indexeddb".into()));
    };
    let storage = IndexedDbSettingsStorage::open(databases.as_ref(), &name).await?;
    Ok(Arc::new(storage))
}

async fn open_cache(
    caches: Option<Arc<dyn CacheStorage>>,
    name: Option<String>,
) -> Result<Arc<dyn SettingsStorage>> {
    let (Some(caches), Some(name)) = (caches, name) else {
        return Err(Error::Unavailable("cache".into()));
    };
    Ok(Arc::new(CacheSettingsStorage::open(caches, name).await?))
}

async fn open_web_storage(
    area: Option<Arc<dyn StorageArea>>,
    key_prefix: Option<String>,
) -> Result<Arc<dyn SettingsStorage>> {
    let (Some(area), Some(key_prefix)) = (area, key_prefix) else {
        return Err(Error::Unavailable("web-storage".into()));
    };
    Ok(Arc::new(WebStorageSettingsStorage::new(area, key_prefix)?))
}

impl fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSelector")
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

/// What a server process can offer the selector
#[derive(Debug, Default, Clone)]
pub struct ServerEnvironment {
    pub collection: Option<Arc<dyn SettingsCollection>>,
    pub file_path: Option<PathBuf>,
    /// Overrides the format inferred from `file_path`
    pub format: Option<SettingsFormat>,
}

/// What a browser-like host can offer the selector
#[derive(Debug, Clone)]
pub struct BrowserEnvironment {
    pub databases: Option<Arc<dyn ObjectDatabaseFactory>>,
    pub database_name: Option<String>,
    pub caches: Option<Arc<dyn CacheStorage>>,
    pub cache_name: Option<String>,
    pub local_storage: Option<Arc<dyn StorageArea>>,
    pub session_storage: Option<Arc<dyn StorageArea>>,
    /// Use `session_storage` instead of `local_storage`
    pub session: bool,
    pub key_prefix: Option<String>,
}

impl Default for BrowserEnvironment {
    fn default() -> Self {
        Self {
            databases: None,
            database_name: Some(DEFAULT_DATABASE_NAME.to_string()),
            caches: None,
            cache_name: Some(DEFAULT_CACHE_NAME.to_string()),
            local_storage: None,
            session_storage: None,
            session: false,
            key_prefix: Some(DEFAULT_MODULE.to_string()),
        }
    }
}

pub const DEFAULT_DATABASE_NAME: &str = "settings";
pub const DEFAULT_CACHE_NAME: &str = "settings";
