//! `XferSite` Core Library
//!
//! This crate provides the core functionality for the `XferSite` session
//! profile manager: session descriptors, their persistence in a hierarchical
//! profile store, session URL resolution, the stored site collection with
//! folders and workspaces, and import/export to other tools.

pub mod algorithms;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod persistence;
pub mod secret;
pub mod sessions;
pub mod storage;
pub mod url;

pub use algorithms::{Algorithm, Cipher, Kex};
pub use config::{AppSettings, ConfigManager};
pub use error::{
    ConfigError, ConfigResult, ImportError, SecretError, SessionError, SessionResult,
    StorageError, StorageResult, XferSiteError,
};
pub use export::{ExportTarget, PuttyExporter};
pub use import::{FileZillaImporter, ImportResult, ImportSource, PuttyImporter, SkippedEntry};
pub use models::{FsProtocol, Ftps, SessionData, DEFAULT_SESSION_NAME};
pub use persistence::{SaveMode, SessionPersistence};
pub use secret::{MasterPasswordCodec, ScrambleCodec, SecretCodec};
pub use sessions::{SessionStatistics, StoredSessionList};
pub use storage::{
    AccessMode, HierarchicalStorage, MemoryStorage, MemoryStorageFactory, StorageFactory,
    TomlFileStorage,
};
pub use url::{SessionOptions, SessionUrlFlags, UrlParseOutcome};
