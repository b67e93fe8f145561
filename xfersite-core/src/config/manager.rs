//! Configuration directory handling.
//!
//! `ConfigManager` owns one directory holding `config.toml` (the
//! [`AppSettings`]) and `sessions.toml` (the profile store). It is also the
//! [`StorageFactory`] the site collection opens that store through.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult, StorageResult};
use crate::persistence::SessionPersistence;
use crate::secret::{EnvMasterPassword, MasterPasswordCodec, ScrambleCodec, SecretCodec};
use crate::sessions::StoredSessionList;
use crate::storage::{
    AccessMode, HierarchicalStorage, StorageFactory, TomlFileStorage, DEFAULT_SESSIONS_SUB_KEY,
};

use super::settings::AppSettings;

const SESSIONS_FILE: &str = "sessions.toml";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable the master password is read from
pub const MASTER_PASSWORD_ENV: &str = "XFERSITE_MASTER_PASSWORD";

/// Entry point to the on-disk state of `XferSite`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
    /// Key of the profile store holding the sites
    sessions_sub_key: String,
}

impl ConfigManager {
    /// Uses `xfersite` below the platform config directory
    /// (`~/.config/xfersite` on Linux).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no config directory.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("$XDG_CONFIG_HOME")))?;
        Ok(Self::with_config_dir(base.join("xfersite")))
    }

    /// Uses `config_dir` as is
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            sessions_sub_key: DEFAULT_SESSIONS_SUB_KEY.to_string(),
        }
    }

    /// Takes the profile store layout from `settings`
    #[must_use]
    pub fn with_settings(mut self, settings: &AppSettings) -> Self {
        let key = settings.storage.sessions_sub_key.trim();
        if !key.is_empty() {
            self.sessions_sub_key = key.to_string();
        }
        self
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the profile store
    #[must_use]
    pub fn sessions_file(&self) -> PathBuf {
        self.config_dir.join(SESSIONS_FILE)
    }

    /// Creates the config directory with its parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> ConfigResult<()> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| ConfigError::Write(format!("{}: {e}", self.config_dir.display())))
    }

    // ========== Settings ==========

    /// Reads `config.toml`, or the defaults when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        read_toml(&self.config_dir.join(CONFIG_FILE))
    }

    /// Writes `config.toml`, creating the directory first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be written.
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        write_toml(&self.config_dir.join(CONFIG_FILE), settings)
    }

    // ========== Sessions ==========

    /// Secret codec selected by `settings`.
    ///
    /// With master password protection enabled, a missing salt is generated
    /// and saved to the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored salt is not valid hex, or if a new
    /// salt cannot be generated or saved.
    pub fn secret_codec(&self, settings: &mut AppSettings) -> ConfigResult<Arc<dyn SecretCodec>> {
        if !settings.security.use_master_password {
            return Ok(Arc::new(ScrambleCodec::new()));
        }

        let invalid_salt = |reason: String| ConfigError::Validation {
            field: "security.master_password_salt".to_string(),
            reason,
        };
        let salt = match settings.security.master_password_salt.as_deref() {
            Some(salt) => hex::decode(salt).map_err(|e| invalid_salt(e.to_string()))?,
            None => {
                let salt = MasterPasswordCodec::generate_salt()
                    .map_err(|e| invalid_salt(e.to_string()))?;
                settings.security.master_password_salt = Some(hex::encode(salt));
                self.save_settings(settings)?;
                tracing::info!("Generated master password salt");
                salt.to_vec()
            }
        };

        Ok(Arc::new(MasterPasswordCodec::new(
            Box::new(EnvMasterPassword::new(MASTER_PASSWORD_ENV)),
            salt,
        )))
    }

    /// Site collection over the profile store, configured by `settings`.
    ///
    /// The collection is not loaded yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret codec cannot be set up.
    pub fn session_list(&self, settings: &mut AppSettings) -> ConfigResult<StoredSessionList> {
        let codec = self.secret_codec(settings)?;
        let persistence = SessionPersistence::new()
            .with_password_storing_disabled(settings.security.disable_password_storing);
        let factory = self.clone().with_settings(settings);
        Ok(StoredSessionList::with_codec(Arc::new(factory), codec).with_persistence(persistence))
    }
}

fn read_toml<T>(path: &Path) -> ConfigResult<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(ConfigError::Parse(format!("{}: {e}", path.display()))),
    };
    toml::from_str(&content)
        .map_err(|e| ConfigError::Deserialize(format!("{}: {e}", path.display())))
}

fn write_toml<T: serde::Serialize>(path: &Path, value: &T) -> ConfigResult<()> {
    let content =
        toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    fs::write(path, content).map_err(|e| ConfigError::Write(format!("{}: {e}", path.display())))
}

impl StorageFactory for ConfigManager {
    fn create_storage(&self, mode: AccessMode) -> StorageResult<Box<dyn HierarchicalStorage>> {
        Ok(Box::new(TomlFileStorage::open(self.sessions_file(), mode)?))
    }

    fn sessions_sub_key(&self) -> &str {
        &self.sessions_sub_key
    }
}
