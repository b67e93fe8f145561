//! Master password protected secrets
//!
//! Strong secrets are sealed with AES-256-GCM. The key is derived from the
//! master password with Argon2id and cached for the life of the codec. The
//! secret's key material is bound as associated data, so a ciphertext only
//! opens for the site it was written for.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use argon2::{Algorithm, Argon2, Params, Version};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretBox, SecretString};

use crate::error::{SecretError, SecretResult};

use super::scramble::{ScrambleCodec, SCRAMBLE_MARKER};
use super::SecretCodec;

const STRONG_MARKER: u8 = 0x02;
const KEY_LEN: usize = 32;

/// Supplies the master password, typically by prompting.
pub trait MasterPasswordSource: Send + Sync + fmt::Debug {
    /// Returns the master password.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::PromptAborted` if the user declined.
    fn master_password(&self) -> SecretResult<SecretString>;
}

/// A master password known up front
#[derive(Debug)]
pub struct StaticMasterPassword(SecretString);

impl StaticMasterPassword {
    /// Wraps `password`
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self(SecretString::from(password.into()))
    }
}

impl MasterPasswordSource for StaticMasterPassword {
    fn master_password(&self) -> SecretResult<SecretString> {
        Ok(self.0.clone())
    }
}

/// Reads the master password from an environment variable.
///
/// An unset variable counts as an aborted prompt.
#[derive(Debug, Clone)]
pub struct EnvMasterPassword {
    variable: String,
}

impl EnvMasterPassword {
    /// Reads from `variable`
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl MasterPasswordSource for EnvMasterPassword {
    fn master_password(&self) -> SecretResult<SecretString> {
        std::env::var(&self.variable)
            .ok()
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
            .ok_or(SecretError::PromptAborted)
    }
}

/// Codec sealing secrets under a master password.
pub struct MasterPasswordCodec {
    source: Box<dyn MasterPasswordSource>,
    salt: Vec<u8>,
    key: Mutex<Option<SecretBox<[u8; KEY_LEN]>>>,
    rng: SystemRandom,
}

impl fmt::Debug for MasterPasswordCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterPasswordCodec")
            .field("source", &self.source)
            .field("unlocked", &self.is_unlocked())
            .finish_non_exhaustive()
    }
}

impl MasterPasswordCodec {
    /// Creates a locked codec.
    ///
    /// `salt` must be stable across runs, it is kept in the application
    /// settings.
    #[must_use]
    pub fn new(source: Box<dyn MasterPasswordSource>, salt: impl Into<Vec<u8>>) -> Self {
        Self {
            source,
            salt: salt.into(),
            key: Mutex::new(None),
            rng: SystemRandom::new(),
        }
    }

    /// Generates a random salt suitable for [`MasterPasswordCodec::new`].
    ///
    /// # Errors
    ///
    /// Returns `SecretError::Crypto` if the system RNG fails.
    pub fn generate_salt() -> SecretResult<[u8; 16]> {
        let mut salt = [0u8; 16];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| SecretError::Crypto("random generator unavailable".to_string()))?;
        Ok(salt)
    }

    /// Returns true once the master password has been supplied
    pub fn is_unlocked(&self) -> bool {
        self.key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Obtains the master password and derives the key if not done yet.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::PromptAborted` if the source declines, or
    /// `SecretError::Crypto` if key derivation fails.
    pub fn unlock(&self) -> SecretResult<()> {
        let mut slot = self.key.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            let password = self.source.master_password()?;
            *slot = Some(derive_key(password.expose_secret(), &self.salt)?);
            tracing::debug!("Master password key derived");
        }
        Ok(())
    }

    fn sealing_key(&self) -> SecretResult<Option<LessSafeKey>> {
        let slot = self.key.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .map(|key| {
                UnboundKey::new(&AES_256_GCM, key.expose_secret())
                    .map(LessSafeKey::new)
                    .map_err(|_| SecretError::Crypto("invalid AES key".to_string()))
            })
            .transpose()
    }

    fn seal(&self, key: &LessSafeKey, plain: &str, key_material: &str) -> SecretResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| SecretError::Crypto("random generator unavailable".to_string()))?;

        let mut in_out = plain.as_bytes().to_vec();
        key.seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::from(key_material.as_bytes()),
            &mut in_out,
        )
        .map_err(|_| SecretError::Crypto("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(1 + NONCE_LEN + in_out.len());
        sealed.push(STRONG_MARKER);
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(sealed)
    }

    fn open(&self, body: &[u8], key_material: &str) -> SecretResult<String> {
        if body.len() < NONCE_LEN {
            return Err(SecretError::Corrupt("truncated secret".to_string()));
        }
        self.unlock()?;
        let key = self
            .sealing_key()?
            .ok_or_else(|| SecretError::Crypto("codec is locked".to_string()))?;

        let (nonce_bytes, sealed) = body.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| SecretError::Corrupt("bad nonce".to_string()))?;
        let mut in_out = sealed.to_vec();
        let plain = key
            .open_in_place(nonce, Aad::from(key_material.as_bytes()), &mut in_out)
            .map_err(|_| SecretError::KeyMismatch)?;

        String::from_utf8(plain.to_vec()).map_err(|e| SecretError::Corrupt(e.to_string()))
    }
}

fn derive_key(password: &str, salt: &[u8]) -> SecretResult<SecretBox<[u8; KEY_LEN]>> {
    let params = Params::new(19 * 1024, 2, 1, Some(KEY_LEN))
        .map_err(|e| SecretError::Crypto(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Box::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| SecretError::Crypto(e.to_string()))?;
    Ok(SecretBox::new(key))
}

impl SecretCodec for MasterPasswordCodec {
    fn encrypt(&self, plain: &str, key_material: &str) -> Vec<u8> {
        if plain.is_empty() {
            return Vec::new();
        }
        match self.sealing_key() {
            Ok(Some(key)) => match self.seal(&key, plain, key_material) {
                Ok(sealed) => sealed,
                Err(e) => {
                    tracing::warn!(error = %e, "Falling back to scrambled secret");
                    ScrambleCodec::scramble(plain, key_material)
                }
            },
            _ => ScrambleCodec::scramble(plain, key_material),
        }
    }

    fn decrypt(&self, cipher: &[u8], key_material: &str) -> SecretResult<String> {
        match cipher.split_first() {
            None => Ok(String::new()),
            Some((&STRONG_MARKER, body)) => self.open(body, key_material),
            Some((&SCRAMBLE_MARKER, _)) => ScrambleCodec::unscramble(cipher, key_material),
            Some(_) => Err(SecretError::Corrupt("unknown secret format".to_string())),
        }
    }

    fn strongly_recrypt(&self, cipher: &[u8], key_material: &str) -> SecretResult<Vec<u8>> {
        if cipher.is_empty() || self.is_strong(cipher) {
            return Ok(cipher.to_vec());
        }
        let plain = self.decrypt(cipher, key_material)?;
        self.unlock()?;
        let key = self
            .sealing_key()?
            .ok_or_else(|| SecretError::Crypto("codec is locked".to_string()))?;
        self.seal(&key, &plain, key_material)
    }

    fn is_strong(&self, cipher: &[u8]) -> bool {
        cipher.first() == Some(&STRONG_MARKER)
    }
}
