//! Error types for `XferSite`
//!
//! This module defines all error types used throughout the `XferSite` crates,
//! providing descriptive error messages for configuration, storage, secret
//! handling, session resolution and import operations.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for `XferSite` operations
#[derive(Debug, Error)]
pub enum XferSiteError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Hierarchical storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Secret codec errors
    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    /// Session descriptor and URL resolution errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Import errors (PuTTY, FileZilla)
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The reason for validation failure
        reason: String,
    },

    /// Configuration directory could not be determined
    #[error("Configuration directory not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Failed to deserialize configuration
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(String),
}

/// Errors raised by hierarchical storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write was attempted on storage opened read-only
    #[error("Storage is read-only")]
    ReadOnly,

    /// No subkey is open where one is required
    #[error("No subkey is open")]
    NoOpenKey,

    /// Failed to parse the backing file
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// Backing file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Failed to serialize the tree
    #[error("Failed to serialize storage: {0}")]
    Serialize(String),

    /// I/O error on the backing file
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to secret encryption and decryption
#[derive(Debug, Error)]
pub enum SecretError {
    /// The user aborted the master password prompt
    #[error("Master password prompt aborted")]
    PromptAborted,

    /// Ciphertext was produced for different key material
    #[error("Secret does not match its key material")]
    KeyMismatch,

    /// Ciphertext is malformed
    #[error("Corrupt secret: {0}")]
    Corrupt(String),

    /// The underlying cipher failed
    #[error("Cryptographic failure: {0}")]
    Crypto(String),
}

/// Errors related to session descriptors, URLs and the profile collection
#[derive(Debug, Error)]
pub enum SessionError {
    /// Profile name is not acceptable
    #[error("Invalid site name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A command-line switch carried an unusable value
    #[error("Invalid value '{value}' for switch '{switch}'")]
    InvalidSwitch {
        /// Switch name
        switch: String,
        /// Offending value
        value: String,
    },

    /// Stored site not found
    #[error("Site not found: {0}")]
    NotFound(String),

    /// Storage failure while persisting a collection change
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors related to session import operations
#[derive(Debug, Error)]
pub enum ImportError {
    /// Failed to parse import source
    #[error("Failed to parse {source_name}: {reason}")]
    ParseError {
        /// The import source (e.g., "PuTTY", "FileZilla")
        source_name: String,
        /// The reason for parse failure
        reason: String,
    },

    /// Import source file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid entry in import source
    #[error("Invalid entry in {source_name}: {reason}")]
    InvalidEntry {
        /// The import source
        source_name: String,
        /// The reason the entry is invalid
        reason: String,
    },

    /// Storage failure while loading an imported entry
    #[error("Storage error during import: {0}")]
    Storage(#[from] StorageError),

    /// I/O error during import
    #[error("IO error during import: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for `XferSite` operations
pub type Result<T> = std::result::Result<T, XferSiteError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for secret operations
pub type SecretResult<T> = std::result::Result<T, SecretError>;

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result type alias for import operations
pub type ImportOutcome<T> = std::result::Result<T, ImportError>;
