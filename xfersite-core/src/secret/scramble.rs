//! Deterministic password scrambling

use crate::error::{SecretError, SecretResult};

use super::SecretCodec;

/// Leading byte of scrambled secrets
pub(crate) const SCRAMBLE_MARKER: u8 = 0x01;
const SCRAMBLE_MASK: u8 = 0xA3;

/// Reversible obfuscation keyed by the secret's key material.
///
/// This only hides secrets from casual inspection. The output is
/// deterministic, which keeps saved profile files stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrambleCodec;

impl ScrambleCodec {
    /// Creates the codec
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub(crate) fn scramble(plain: &str, key_material: &str) -> Vec<u8> {
        if plain.is_empty() {
            return Vec::new();
        }
        let payload = key_material
            .bytes()
            .chain(std::iter::once(0))
            .chain(plain.bytes());
        std::iter::once(SCRAMBLE_MARKER)
            .chain(payload.enumerate().map(|(i, b)| b ^ mask(i)))
            .collect()
    }

    pub(crate) fn unscramble(cipher: &[u8], key_material: &str) -> SecretResult<String> {
        let Some((&marker, body)) = cipher.split_first() else {
            return Ok(String::new());
        };
        if marker != SCRAMBLE_MARKER {
            return Err(SecretError::Corrupt("unknown secret format".to_string()));
        }

        let payload: Vec<u8> = body.iter().enumerate().map(|(i, b)| b ^ mask(i)).collect();
        let key = key_material.as_bytes();
        if payload.len() <= key.len() || !payload.starts_with(key) || payload[key.len()] != 0 {
            return Err(SecretError::KeyMismatch);
        }

        String::from_utf8(payload[key.len() + 1..].to_vec())
            .map_err(|e| SecretError::Corrupt(e.to_string()))
    }
}

fn mask(index: usize) -> u8 {
    SCRAMBLE_MASK ^ (index.wrapping_mul(31) as u8)
}

impl SecretCodec for ScrambleCodec {
    fn encrypt(&self, plain: &str, key_material: &str) -> Vec<u8> {
        Self::scramble(plain, key_material)
    }

    fn decrypt(&self, cipher: &[u8], key_material: &str) -> SecretResult<String> {
        Self::unscramble(cipher, key_material)
    }

    fn strongly_recrypt(&self, cipher: &[u8], key_material: &str) -> SecretResult<Vec<u8>> {
        // validates the key material even though the form does not change
        Self::unscramble(cipher, key_material)?;
        Ok(cipher.to_vec())
    }

    fn is_strong(&self, _cipher: &[u8]) -> bool {
        true
    }
}
