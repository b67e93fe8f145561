//! The secret codec seam

use std::fmt;

use crate::error::SecretResult;

/// Encrypts and decrypts secrets bound to key material.
///
/// Empty plaintext always encrypts to an empty ciphertext and an empty
/// ciphertext always decrypts to an empty string.
pub trait SecretCodec: Send + Sync + fmt::Debug {
    /// Encrypts `plain` for `key_material`.
    ///
    /// Never prompts. Codecs that need an interactive secret fall back to a
    /// weaker form until [`SecretCodec::strongly_recrypt`] is called.
    fn encrypt(&self, plain: &str, key_material: &str) -> Vec<u8>;

    /// Decrypts `cipher` produced for `key_material`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::PromptAborted` if the user declined to unlock
    /// the codec, `SecretError::KeyMismatch` if the ciphertext belongs to
    /// different key material, or `SecretError::Corrupt` for malformed input.
    fn decrypt(&self, cipher: &[u8], key_material: &str) -> SecretResult<String>;

    /// Re-wraps `cipher` in the strongest form the codec offers.
    ///
    /// # Errors
    ///
    /// Same as [`SecretCodec::decrypt`].
    fn strongly_recrypt(&self, cipher: &[u8], key_material: &str) -> SecretResult<Vec<u8>>;

    /// Returns true if `cipher` is already in the strongest form
    fn is_strong(&self, cipher: &[u8]) -> bool;
}
