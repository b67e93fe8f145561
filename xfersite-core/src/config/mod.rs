//! Configuration management for `XferSite`
//!
//! This module provides the `ConfigManager` for loading and saving
//! configuration files in TOML format. The manager also serves as the
//! storage factory of the profile store.

mod manager;
pub mod settings;

pub use manager::{ConfigManager, MASTER_PASSWORD_ENV};
pub use settings::{AppSettings, LoggingSettings, SecuritySettings, StorageSettings};
