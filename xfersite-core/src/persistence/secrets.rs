//! Secret handling of the persistence codec

use crate::error::{Result, StorageResult};
use crate::models::SessionData;
use crate::storage::{sub_key, HierarchicalStorage};

use super::{SaveMode, SessionPersistence};

const PASSWORD: &str = "Password";
const PASSWORD_PLAIN: &str = "PasswordPlain";
const PROXY_PASSWORD_ENC: &str = "ProxyPasswordEnc";
const PROXY_PASSWORD_PLAIN: &str = "ProxyPassword";
const TUNNEL_PASSWORD: &str = "TunnelPassword";
const TUNNEL_PASSWORD_PLAIN: &str = "TunnelPasswordPlain";

impl SessionPersistence {
    /// Reads the stored secrets, returning true if any was in plaintext
    pub(super) fn load_secrets(&self, data: &mut SessionData, storage: &dyn HierarchicalStorage) -> bool {
        let mut rewrite = false;

        if !self.disable_password_storing {
            if storage.value_exists(PASSWORD_PLAIN) {
                let plain = storage.read_string(PASSWORD_PLAIN, "");
                data.set_password(&plain);
                rewrite = true;
            } else if let Some(cipher) = storage.read_binary(PASSWORD) {
                data.password = cipher;
            }
        }

        // plaintext takes precedence over the encrypted form
        if storage.value_exists(PROXY_PASSWORD_PLAIN) {
            let plain = storage.read_string(PROXY_PASSWORD_PLAIN, "");
            data.set_proxy_password(&plain);
        } else if let Some(cipher) = storage.read_binary(PROXY_PASSWORD_ENC) {
            data.proxy_password = cipher;
        }

        if !self.disable_password_storing {
            if storage.value_exists(TUNNEL_PASSWORD_PLAIN) {
                let plain = storage.read_string(TUNNEL_PASSWORD_PLAIN, "");
                data.set_tunnel_password(&plain);
                rewrite = true;
            } else if let Some(cipher) = storage.read_binary(TUNNEL_PASSWORD) {
                data.tunnel_password = cipher;
            }
        }

        rewrite
    }

    /// Writes the secrets of `data` into the current key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects a write.
    pub fn save_passwords(
        &self,
        data: &SessionData,
        storage: &mut dyn HierarchicalStorage,
        mode: SaveMode,
    ) -> StorageResult<()> {
        if !self.disable_password_storing && mode == SaveMode::Native && !data.password.is_empty() {
            let cipher = strong(data, &data.password, &data.password_key());
            storage.write_binary(PASSWORD, &cipher)?;
        } else {
            storage.delete_value(PASSWORD)?;
        }
        storage.delete_value(PASSWORD_PLAIN)?;

        match mode {
            SaveMode::PuttyExport => {
                storage.write_string(PROXY_PASSWORD_PLAIN, &data.proxy_password())?;
            }
            SaveMode::Plaintext => {
                write_or_delete_plain(storage, PROXY_PASSWORD_PLAIN, &data.proxy_password())?;
                storage.delete_value(PROXY_PASSWORD_ENC)?;
                write_or_delete_plain(storage, TUNNEL_PASSWORD_PLAIN, &data.tunnel_password())?;
                storage.delete_value(TUNNEL_PASSWORD)?;
            }
            SaveMode::Native => {
                if data.proxy_password.is_empty() {
                    storage.delete_value(PROXY_PASSWORD_ENC)?;
                } else {
                    let cipher = strong(data, &data.proxy_password, &data.proxy_password_key());
                    storage.write_binary(PROXY_PASSWORD_ENC, &cipher)?;
                }
                storage.delete_value(PROXY_PASSWORD_PLAIN)?;

                if self.disable_password_storing || data.tunnel_password.is_empty() {
                    storage.delete_value(TUNNEL_PASSWORD)?;
                } else {
                    let cipher = strong(data, &data.tunnel_password, &data.tunnel_password_key());
                    storage.write_binary(TUNNEL_PASSWORD, &cipher)?;
                }
                storage.delete_value(TUNNEL_PASSWORD_PLAIN)?;
            }
        }
        Ok(())
    }

    /// Re-wraps the secrets of `data` in the strongest form and writes only
    /// them into its subkey below the current key.
    ///
    /// # Errors
    ///
    /// Returns a secret error if re-wrapping fails (for example the master
    /// password prompt was aborted) or a storage error if writing fails.
    pub fn save_recrypted_passwords(
        &self,
        data: &mut SessionData,
        storage: &mut dyn HierarchicalStorage,
    ) -> Result<()> {
        if let Some(mut sub) = sub_key(storage, &data.internal_storage_key(), true)? {
            data.recrypt_passwords()?;
            self.save_passwords(data, &mut *sub, SaveMode::Native)?;
        }
        Ok(())
    }
}

/// Writes the secrets as they are, replacing plaintext leftovers
pub(super) fn write_encrypted(
    data: &SessionData,
    storage: &mut dyn HierarchicalStorage,
    disable_password_storing: bool,
) -> StorageResult<()> {
    storage.delete_value(PASSWORD_PLAIN)?;
    if !disable_password_storing && !data.password.is_empty() {
        storage.write_binary(PASSWORD, &data.password)?;
    }
    storage.delete_value(TUNNEL_PASSWORD_PLAIN)?;
    if !disable_password_storing && !data.tunnel_password.is_empty() {
        storage.write_binary(TUNNEL_PASSWORD, &data.tunnel_password)?;
    }
    Ok(())
}

fn write_or_delete_plain(
    storage: &mut dyn HierarchicalStorage,
    key: &str,
    plain: &str,
) -> StorageResult<()> {
    if plain.is_empty() {
        storage.delete_value(key)?;
        Ok(())
    } else {
        storage.write_string(key, plain)
    }
}

/// Strongest form of `cipher`, or `cipher` itself if re-wrapping fails
fn strong(data: &SessionData, cipher: &[u8], key_material: &str) -> Vec<u8> {
    match data.codec.strongly_recrypt(cipher, key_material) {
        Ok(strong) => strong,
        Err(e) => {
            tracing::warn!(site = %data.session_name(), error = %e, "Keeping secret in its current form");
            cipher.to_vec()
        }
    }
}
