//! Application settings model
//!
//! This module defines the application-wide settings stored in config.toml.

use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_SESSIONS_SUB_KEY;

/// Application-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Password protection settings
    #[serde(default)]
    pub security: SecuritySettings,
    /// Profile store settings
    #[serde(default)]
    pub storage: StorageSettings,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// How stored passwords are protected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Never write session passwords to the profile store
    #[serde(default)]
    pub disable_password_storing: bool,
    /// Encrypt passwords with a key derived from a master password
    #[serde(default)]
    pub use_master_password: bool,
    /// Hex encoded salt for the master password key, generated on first use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_password_salt: Option<String>,
}

/// Profile store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Key holding the stored sites
    #[serde(default = "default_sessions_sub_key")]
    pub sessions_sub_key: String,
}

fn default_sessions_sub_key() -> String {
    DEFAULT_SESSIONS_SUB_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            sessions_sub_key: default_sessions_sub_key(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
