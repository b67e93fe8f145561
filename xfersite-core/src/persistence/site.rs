//! Storage side effects of a single site

use crate::error::StorageResult;
use crate::models::SessionData;
use crate::storage::{munge_key_name, sub_key, AccessMode, HierarchicalStorage, StorageFactory};

/// Key holding cached host keys
pub const SSH_HOST_KEYS_SUB_KEY: &str = "SshHostKeys";

/// PuTTY host key type for a fingerprint such as `ssh-rsa 2048 aa:bb:...`
#[must_use]
pub fn key_type_from_fingerprint(fingerprint: &str) -> &str {
    let mut parts = fingerprint.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("ssh-rsa"), Some(_)) => "rsa2",
        (Some("ssh-dss"), Some(_)) => "dss",
        (Some(key_type), Some(_)) => key_type,
        _ => "rsa2",
    }
}

impl SessionData {
    /// Caches the configured host key unless one is cached already.
    ///
    /// The key is written below [`SSH_HOST_KEYS_SUB_KEY`] of `storage` as
    /// `<type>@<port>:<host>`. Returns true if it was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects the write.
    pub fn cache_host_key_if_not_cached(
        &self,
        storage: &mut dyn HierarchicalStorage,
    ) -> StorageResult<bool> {
        if self.host_key().is_empty() {
            return Ok(false);
        }
        let name = munge_key_name(&format!(
            "{}@{}:{}",
            key_type_from_fingerprint(self.host_key()),
            self.port_number(),
            self.host_name()
        ));

        let mode = storage.access_mode();
        storage.set_access_mode(AccessMode::ReadWrite);
        let result = self.write_host_key(storage, &name);
        storage.set_access_mode(mode);
        result
    }

    fn write_host_key(&self, storage: &mut dyn HierarchicalStorage, name: &str) -> StorageResult<bool> {
        let written = match sub_key(storage, SSH_HOST_KEYS_SUB_KEY, true)? {
            Some(mut keys) if !keys.value_exists(name) => {
                keys.write_string(name, self.host_key())?;
                true
            }
            _ => false,
        };
        if written {
            tracing::debug!(host = %self.host_name(), "Cached host key");
            storage.flush()?;
        }
        Ok(written)
    }

    /// Deletes the site's subkey from the profile store.
    ///
    /// Returns true if there was one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or written.
    pub fn remove(&self, factory: &dyn StorageFactory) -> StorageResult<bool> {
        let mut storage = factory.create_storage(AccessMode::ReadWrite)?;
        let removed = match sub_key(storage.as_mut(), factory.sessions_sub_key(), false)? {
            Some(mut sessions) => sessions.recursive_delete_sub_key(&self.internal_storage_key())?,
            None => false,
        };
        if removed {
            storage.flush()?;
        }
        Ok(removed)
    }
}
