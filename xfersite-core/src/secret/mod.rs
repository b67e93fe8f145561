//! Secret protection for stored session passwords
//!
//! Passwords are never kept in plaintext inside a session descriptor. They
//! are encrypted with a [`SecretCodec`] bound to per-field key material (for
//! the session password that is `user name + host name`), so a ciphertext
//! copied to another site does not decrypt there.
//!
//! Two codecs are provided:
//! - [`ScrambleCodec`]: deterministic obfuscation, used when no master
//!   password is configured
//! - [`MasterPasswordCodec`]: AES-256-GCM under an Argon2id-derived key

mod codec;
mod master;
mod scramble;

pub use codec::SecretCodec;
pub use master::{
    EnvMasterPassword, MasterPasswordCodec, MasterPasswordSource, StaticMasterPassword,
};
pub use scramble::ScrambleCodec;
