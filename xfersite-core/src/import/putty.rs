//! PuTTY session importer.
//!
//! Reads the session files PuTTY keeps in `~/.putty/sessions`. Each file is
//! named after the munged session name and holds `Key=Value` lines using the
//! same key names as the profile store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ImportError, ImportOutcome};
use crate::models::{SessionData, DEFAULT_SESSION_NAME, PUTTY_SSH_PROTOCOL};
use crate::persistence::SessionPersistence;
use crate::storage::{unmunge_name, MemoryStorage};

use super::traits::{ImportResult, ImportSource};

/// Importer for PuTTY session files
pub struct PuttyImporter {
    custom_paths: Vec<PathBuf>,
    defaults: SessionData,
    ssh_only: bool,
}

impl PuttyImporter {
    /// Creates an importer looking at the default session directory
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom_paths: Vec::new(),
            defaults: SessionData::new(""),
            ssh_only: false,
        }
    }

    /// Creates an importer looking at custom session directories
    #[must_use]
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            custom_paths: paths,
            ..Self::new()
        }
    }

    /// Seeds imported sites from `defaults` instead of factory defaults
    #[must_use]
    pub fn with_defaults(mut self, defaults: SessionData) -> Self {
        self.defaults = defaults;
        self
    }

    /// Skips sessions using a protocol other than SSH
    #[must_use]
    pub const fn with_ssh_only(mut self, ssh_only: bool) -> Self {
        self.ssh_only = ssh_only;
        self
    }

    /// Parses the content of one session file
    #[must_use]
    pub fn parse_session(&self, name: &str, content: &str) -> SessionData {
        let pairs = content.lines().filter_map(|line| {
            let line = line.trim_end_matches('\r');
            line.split_once('=')
        });
        let storage = MemoryStorage::from_pairs(pairs);

        let mut data = self.defaults.clone();
        data.set_name(SessionData::make_valid_name(name));
        SessionPersistence::new().do_load(&mut data, &storage);
        data
    }

    /// Imports every session file of `dir`
    fn import_dir(&self, dir: &Path) -> ImportOutcome<ImportResult> {
        let source_path = dir.display().to_string();
        let mut result = ImportResult::new();

        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        for path in entries {
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let name = unmunge_name(file_name);
            if name == DEFAULT_SESSION_NAME {
                continue;
            }

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    result.add_error(ImportError::ParseError {
                        source_name: "PuTTY".to_string(),
                        reason: format!("{}: {e}", path.display()),
                    });
                    continue;
                }
            };

            let data = self.parse_session(&name, &content);
            if self.ssh_only && data.normalized_putty_protocol() != PUTTY_SSH_PROTOCOL {
                let reason = format!("Protocol {} is not SSH", data.normalized_putty_protocol());
                result.skip(name, reason, &source_path);
                continue;
            }
            if !data.can_login() {
                result.skip(name, "Missing host name", &source_path);
                continue;
            }

            debug!(site = %data.name(), "Imported PuTTY session");
            result.add_session(data);
        }

        Ok(result)
    }
}

impl Default for PuttyImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSource for PuttyImporter {
    fn source_id(&self) -> &'static str {
        "putty"
    }

    fn display_name(&self) -> &'static str {
        "PuTTY"
    }

    fn default_paths(&self) -> Vec<PathBuf> {
        if !self.custom_paths.is_empty() {
            return self.custom_paths.clone();
        }
        dirs::home_dir()
            .map(|home| vec![home.join(".putty").join("sessions")])
            .unwrap_or_default()
    }

    fn import_from_path(&self, path: &Path) -> ImportOutcome<ImportResult> {
        if !path.is_dir() {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }
        self.import_dir(path)
    }
}
