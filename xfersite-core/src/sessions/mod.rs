//! Stored site collection
//!
//! This module provides the `StoredSessionList` which keeps the stored sites
//! together with the `Default Settings` descriptor, and persists them through
//! an injected [`StorageFactory`].
//!
//! Sites are kept sorted: visible sites first in natural name order, hidden
//! one-shot sites last. Operations that take an index address that order
//! including hidden sites.

mod statistics;
mod workspace;


use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use crate::error::{SessionError, SessionResult, StorageResult};
use crate::models::{SessionData, DEFAULT_SESSION_NAME, PUTTY_SSH_PROTOCOL};
use crate::persistence::{SaveMode, SessionPersistence};
use crate::secret::{ScrambleCodec, SecretCodec};
use crate::storage::{sub_key, AccessMode, HierarchicalStorage, StorageFactory, TomlFileStorage};
use crate::url::{self, SessionOptions, UrlParseOutcome};

pub use statistics::SessionStatistics;

/// The stored sites and their default settings.
#[derive(Debug)]
pub struct StoredSessionList {
    sessions: Vec<SessionData>,
    default_settings: SessionData,
    factory: Arc<dyn StorageFactory>,
    persistence: SessionPersistence,
    codec: Arc<dyn SecretCodec>,
    read_only: bool,
}

impl StoredSessionList {
    /// Creates an empty collection persisting through `factory`
    #[must_use]
    pub fn new(factory: Arc<dyn StorageFactory>) -> Self {
        Self::with_codec(factory, Arc::new(ScrambleCodec::new()))
    }

    /// Creates an empty collection whose sites use `codec` for secrets
    #[must_use]
    pub fn with_codec(factory: Arc<dyn StorageFactory>, codec: Arc<dyn SecretCodec>) -> Self {
        let default_settings = SessionData::with_codec(DEFAULT_SESSION_NAME, Arc::clone(&codec));
        Self {
            sessions: Vec::new(),
            default_settings,
            factory,
            persistence: SessionPersistence::new(),
            codec,
            read_only: false,
        }
    }

    /// Uses `persistence` for loading and saving
    #[must_use]
    pub const fn with_persistence(mut self, persistence: SessionPersistence) -> Self {
        self.persistence = persistence;
        self
    }

    /// Never persists default settings changes when `read_only`
    #[must_use]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if default settings changes stay in memory
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The persistence codec
    pub const fn persistence(&self) -> &SessionPersistence {
        &self.persistence
    }

    /// The secret codec given to new sites
    pub fn codec(&self) -> &Arc<dyn SecretCodec> {
        &self.codec
    }

    /// The storage factory
    pub fn factory(&self) -> &Arc<dyn StorageFactory> {
        &self.factory
    }

    /// A descriptor with factory defaults using this collection's codec
    #[must_use]
    pub fn new_session_data(&self, name: &str) -> SessionData {
        SessionData::with_codec(name, Arc::clone(&self.codec))
    }

    /// The `Default Settings` descriptor
    pub const fn default_settings(&self) -> &SessionData {
        &self.default_settings
    }

    // ========== Access ==========

    /// Number of visible sites
    pub fn len(&self) -> usize {
        self.sessions.iter().filter(|data| !data.hidden()).count()
    }

    /// Returns true if there is no visible site
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sites including hidden ones
    pub fn len_including_hidden(&self) -> usize {
        self.sessions.len()
    }

    /// Visible sites in order
    pub fn iter(&self) -> impl Iterator<Item = &SessionData> {
        self.sessions.iter().filter(|data| !data.hidden())
    }

    /// All sites in order, hidden ones last
    pub fn iter_including_hidden(&self) -> impl Iterator<Item = &SessionData> {
        self.sessions.iter()
    }

    /// Site at `index`, counting hidden sites
    pub fn get(&self, index: usize) -> Option<&SessionData> {
        self.sessions.get(index)
    }

    /// Mutable site at `index`, counting hidden sites
    pub fn get_mut(&mut self, index: usize) -> Option<&mut SessionData> {
        self.sessions.get_mut(index)
    }

    /// Finds a site by name, ignoring case
    pub fn find_by_name(&self, name: &str) -> Option<&SessionData> {
        self.position(name).map(|index| &self.sessions[index])
    }

    /// Mutable variant of [`StoredSessionList::find_by_name`]
    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut SessionData> {
        self.position(name).map(|index| &mut self.sessions[index])
    }

    /// Stored site that `data` was saved as, if it still describes the same
    /// server account.
    ///
    /// Unnamed, hidden and workspace descriptors never have one.
    pub fn find_same(&self, data: &SessionData) -> Option<&SessionData> {
        if data.hidden() || data.name().is_empty() || data.is_workspace() {
            return None;
        }
        self.find_by_name(data.name())
            .filter(|stored| stored.is_same_site(data))
    }

    /// Index of `data` among the visible sites
    pub fn index_of(&self, data: &SessionData) -> Option<usize> {
        self.iter().position(|stored| stored.name() == data.name())
    }

    /// Sites match case-insensitively, workspace entries exactly
    fn position(&self, name: &str) -> Option<usize> {
        self.sessions.iter().position(|data| {
            if data.is_workspace() {
                data.name() == name
            } else {
                data.name().eq_ignore_ascii_case(name)
            }
        })
    }

    fn order(a: &SessionData, b: &SessionData) -> Ordering {
        a.hidden().cmp(&b.hidden()).then_with(|| a.compare(b))
    }

    fn sort(&mut self) {
        self.sessions.sort_by(Self::order);
    }

    fn insert_sorted(&mut self, data: SessionData) -> usize {
        let index = self
            .sessions
            .partition_point(|existing| Self::order(existing, &data) == Ordering::Less);
        self.sessions.insert(index, data);
        index
    }

    // ========== Loading ==========

    /// Loads the collection from the profile store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn load(&mut self) -> StorageResult<()> {
        let factory = Arc::clone(&self.factory);
        let mut storage = factory.create_storage(AccessMode::ReadOnly)?;
        if let Some(mut sessions) = sub_key(storage.as_mut(), factory.sessions_sub_key(), false)? {
            self.load_from(&mut *sessions, false, false)?;
        }
        Ok(())
    }

    /// Loads every subkey of the current key of `storage`.
    ///
    /// Existing sites are reloaded in place. Unless `as_modified`, sites
    /// without a subkey are dropped; with it, loaded sites are marked
    /// modified so a later save writes them. With `use_defaults` new sites
    /// start from the default settings, which are then left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage fails while reading.
    pub fn load_from(
        &mut self,
        storage: &mut dyn HierarchicalStorage,
        as_modified: bool,
        use_defaults: bool,
    ) -> StorageResult<()> {
        let persistence = self.persistence;
        let was_empty = self.sessions.is_empty();
        let mut loaded = vec![false; self.sessions.len()];

        for name in storage.sub_key_names() {
            if name.is_empty() || name.split('/').any(str::is_empty) {
                tracing::debug!(site = %name, "Skipping stored site with invalid name");
                continue;
            }

            if name == DEFAULT_SESSION_NAME {
                if !use_defaults {
                    persistence.load(&mut self.default_settings, storage)?;
                    if as_modified {
                        self.default_settings.set_modified(true);
                    }
                }
                continue;
            }

            let existing = if was_empty { None } else { self.position(&name) };
            let index = match existing {
                Some(index) => index,
                None => {
                    let mut data = self.new_session_data("");
                    if use_defaults {
                        data.copy_data(&self.default_settings);
                    }
                    data.set_name(name.as_str());
                    self.sessions.push(data);
                    loaded.push(false);
                    self.sessions.len() - 1
                }
            };
            loaded[index] = true;

            let data = &mut self.sessions[index];
            persistence.load(data, storage)?;
            if as_modified {
                data.set_modified(true);
            }
        }

        if !as_modified {
            let mut flags = loaded.into_iter();
            self.sessions.retain(|_| flags.next().unwrap_or(false));
        }
        self.sort();
        tracing::debug!(count = self.sessions.len(), "Loaded stored sites");
        Ok(())
    }

    // ========== Saving ==========

    /// Saves the default settings and the sites to the profile store.
    ///
    /// Only modified descriptors are written unless `all`. Afterwards no
    /// descriptor is marked modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or written.
    pub fn save(&mut self, all: bool) -> StorageResult<()> {
        let factory = Arc::clone(&self.factory);
        let mut storage = factory.create_storage(AccessMode::ReadWrite)?;
        if let Some(mut sessions) = sub_key(storage.as_mut(), factory.sessions_sub_key(), true)? {
            self.save_to(&mut *sessions, all)?;
        }
        storage.flush()?;
        self.saved();
        Ok(())
    }

    /// Saves into the current key of `storage`, with factory defaults as the
    /// baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects a write.
    pub fn save_to(&self, storage: &mut dyn HierarchicalStorage, all: bool) -> StorageResult<()> {
        let factory_defaults = self.new_session_data("");
        let mut written = 0_usize;
        for data in std::iter::once(&self.default_settings).chain(self.sessions.iter()) {
            if all || data.is_modified() {
                self.persistence
                    .save(data, storage, Some(&factory_defaults), SaveMode::Native)?;
                written += 1;
            }
        }
        tracing::debug!(written, all, "Saved stored sites");
        Ok(())
    }

    /// Clears the modified flag of every descriptor
    pub fn saved(&mut self) {
        self.default_settings.set_modified(false);
        for data in &mut self.sessions {
            data.set_modified(false);
        }
    }

    /// Re-wraps every stored secret in the strongest form.
    ///
    /// Sites whose secrets cannot be re-wrapped are reported as
    /// `"<site>: <error>"` and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or flushed.
    pub fn recrypt_passwords(&mut self) -> SessionResult<Vec<String>> {
        let persistence = self.persistence;
        let factory = Arc::clone(&self.factory);
        let mut storage = factory.create_storage(AccessMode::ReadWrite)?;
        let mut errors = Vec::new();
        if let Some(mut sessions) = sub_key(storage.as_mut(), factory.sessions_sub_key(), true)? {
            for data in std::iter::once(&mut self.default_settings).chain(self.sessions.iter_mut()) {
                if let Err(e) = persistence.save_recrypted_passwords(data, &mut *sessions) {
                    errors.push(format!("{}: {}", data.session_name(), e));
                }
            }
        }
        storage.flush()?;
        self.saved();
        if !errors.is_empty() {
            tracing::warn!(failed = errors.len(), "Some secrets were not re-encrypted");
        }
        Ok(errors)
    }

    /// Writes every descriptor into a TOML file below the sessions key.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written or parsed.
    pub fn export(&self, path: &Path) -> StorageResult<()> {
        let mut storage = TomlFileStorage::open(path, AccessMode::ReadWrite)?;
        if let Some(mut sessions) = sub_key(&mut storage, self.factory.sessions_sub_key(), true)? {
            self.save_to(&mut *sessions, true)?;
        }
        storage.flush()?;
        tracing::info!(path = %path.display(), count = self.sessions.len(), "Exported sites");
        Ok(())
    }

    // ========== Import ==========

    /// Copies sites of `from` into this collection and saves.
    ///
    /// Names clashing with existing sites get a numeric suffix. Returns the
    /// names the sites were stored under.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn import(&mut self, from: &Self, only_selected: bool) -> SessionResult<Vec<String>> {
        let sessions = from
            .iter()
            .filter(|data| !only_selected || data.selected())
            .cloned()
            .collect();
        self.import_sessions(sessions)
    }

    /// Adds `sessions` to this collection and saves.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn import_sessions(&mut self, sessions: Vec<SessionData>) -> SessionResult<Vec<String>> {
        let mut names = Vec::with_capacity(sessions.len());
        for mut data in sessions {
            data.make_unique_in(|name| self.position(name).is_some());
            data.set_modified(true);
            names.push(data.name().to_string());
            self.insert_sorted(data);
        }
        self.save(false)?;
        tracing::info!(count = names.len(), "Imported sites");
        Ok(names)
    }

    /// Selects or deselects every visible site
    pub fn select_all(&mut self, select: bool) {
        for data in self.sessions.iter_mut().filter(|data| !data.hidden()) {
            data.set_selected(select);
        }
    }

    /// Selects sites missing from `dest`, only SSH ones when `ssh_only`
    pub fn select_sessions_to_import(&mut self, dest: &Self, ssh_only: bool) {
        for data in self.sessions.iter_mut().filter(|data| !data.hidden()) {
            let selected = (!ssh_only || data.normalized_putty_protocol() == PUTTY_SSH_PROTOCOL)
                && dest.find_by_name(data.name()).is_none();
            data.set_selected(selected);
        }
    }

    // ========== Editing ==========

    /// Stores `data` as `name`, replacing a site of that name.
    ///
    /// The site is marked modified but not saved.
    pub fn new_session(&mut self, name: &str, data: &SessionData) -> &SessionData {
        if let Some(index) = self.position(name) {
            self.sessions.remove(index);
        }
        let mut site = data.clone();
        site.set_name(name);
        site.set_modified(true);
        let index = self.insert_sorted(site);
        &self.sessions[index]
    }

    /// Replaces the default settings and saves them unless read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn set_default_settings(&mut self, data: &SessionData) -> StorageResult<()> {
        self.default_settings.assign(data);
        self.default_settings.set_name(DEFAULT_SESSION_NAME);
        self.default_settings.set_modified(true);
        if !self.read_only {
            self.save(false)?;
        }
        Ok(())
    }

    /// Removes a site from the collection and the profile store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown name or a storage
    /// error if the store cannot be updated.
    pub fn remove(&mut self, name: &str) -> SessionResult<SessionData> {
        let index = self
            .position(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        self.sessions[index].remove(self.factory.as_ref())?;
        let data = self.sessions.remove(index);
        tracing::info!(site = %data.name(), "Removed site");
        Ok(data)
    }

    /// Renames a site within its folder and saves.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidName` if `new_name` contains `/` or is
    /// taken, `SessionError::NotFound` for an unknown site, or a storage
    /// error.
    pub fn rename(&mut self, name: &str, new_name: &str) -> SessionResult<&SessionData> {
        SessionData::validate_name(new_name)?;
        if new_name.trim().is_empty() {
            return Err(SessionError::InvalidName {
                name: new_name.to_string(),
                reason: "site name cannot be empty".to_string(),
            });
        }
        let index = self
            .position(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        let full_name = SessionData::compose_path(
            SessionData::extract_folder_name(self.sessions[index].name()),
            new_name,
        );
        if self
            .position(&full_name)
            .is_some_and(|existing| existing != index)
        {
            return Err(SessionError::InvalidName {
                name: full_name,
                reason: "a site of that name exists".to_string(),
            });
        }

        self.sessions[index].remove(self.factory.as_ref())?;
        let mut data = self.sessions.remove(index);
        tracing::info!(from = %data.name(), to = %full_name, "Renaming site");
        data.set_name(full_name);
        data.set_modified(true);
        let index = self.insert_sorted(data);
        self.save(false)?;
        Ok(&self.sessions[index])
    }

    /// Clears the collection and deletes the whole sessions key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be updated.
    pub fn cleanup(&mut self) -> StorageResult<()> {
        let mut storage = self.factory.create_storage(AccessMode::ReadWrite)?;
        storage.recursive_delete_sub_key(self.factory.sessions_sub_key())?;
        storage.flush()?;
        self.sessions.clear();
        tracing::info!("Deleted all stored sites");
        Ok(())
    }

    // ========== URLs ==========

    /// Resolves `url` against this collection into a new descriptor.
    ///
    /// # Errors
    ///
    /// See [`SessionData::parse_url`].
    pub fn parse_url(
        &mut self,
        url: &str,
        options: Option<&SessionOptions>,
        extract_file_name: bool,
    ) -> SessionResult<(SessionData, UrlParseOutcome)> {
        let mut data = self.new_session_data("");
        let outcome = data.parse_url(url, options, Some(self), extract_file_name)?;
        Ok((data, outcome))
    }

    /// Returns true if `url` names a protocol
    pub fn is_url(&self, url: &str) -> bool {
        url::is_url(url)
    }

    /// Stored site a decoded URL refers to: its name alone or followed by
    /// a path. Workspace entries never match.
    pub(crate) fn find_url_match(&self, decoded: &str) -> Option<(usize, &SessionData)> {
        self.sessions.iter().enumerate().find(|(_, data)| {
            let name = data.name();
            !data.is_workspace()
                && !name.is_empty()
                && decoded
                    .get(..name.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(name))
                && (decoded.len() == name.len() || decoded[name.len()..].starts_with('/'))
        })
    }

    /// Removes a hidden site matched by a URL and persists the removal
    pub(crate) fn consume_hidden(&mut self, index: usize) -> SessionResult<()> {
        if index >= self.sessions.len() {
            return Ok(());
        }
        self.sessions[index].remove(self.factory.as_ref())?;
        let data = self.sessions.remove(index);
        self.save(false)?;
        tracing::info!(site = %data.name_without_hidden_prefix(), "Consumed one-shot site");
        Ok(())
    }
}
