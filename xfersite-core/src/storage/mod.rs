//! Hierarchical key/value storage for session profiles
//!
//! Profiles are persisted into a registry-like tree: every site is a subkey
//! of the sessions key and every setting a named value inside it. The
//! [`HierarchicalStorage`] trait is the seam the persistence code is written
//! against; [`MemoryStorage`] and [`TomlFileStorage`] implement it.

mod factory;
mod memory;
mod toml_file;
mod value;

use std::ops::{Deref, DerefMut};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::StorageResult;

pub use factory::{MemoryStorageFactory, StorageFactory, DEFAULT_SESSIONS_SUB_KEY};
pub use memory::{MemoryStorage, StorageNode};
pub use toml_file::TomlFileStorage;
pub use value::{parse_bool, StorageValue};

/// Whether a storage accepts writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Reads only, writes fail with `StorageError::ReadOnly`
    #[default]
    ReadOnly,
    /// Reads and writes
    ReadWrite,
}

/// A tree of keys holding named, loosely typed values.
///
/// Keys are opened relative to the currently open key and must be closed in
/// reverse order; [`sub_key`] returns a guard doing that automatically.
/// Value names compare case-insensitively. Typed reads never fail: a missing
/// value or one that cannot be converted yields the supplied default.
pub trait HierarchicalStorage {
    /// Current access mode
    fn access_mode(&self) -> AccessMode;

    /// Switches the access mode
    fn set_access_mode(&mut self, mode: AccessMode);

    /// Opens (optionally creating) a subkey of the current key.
    ///
    /// Returns `Ok(false)` when the key does not exist and cannot be created.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn open_sub_key(&mut self, name: &str, can_create: bool) -> StorageResult<bool>;

    /// Closes the most recently opened subkey
    fn close_sub_key(&mut self);

    /// Names of the subkeys of the current key
    fn sub_key_names(&self) -> Vec<String>;

    /// Names of the values of the current key
    fn value_names(&self) -> Vec<String>;

    /// Returns true if the current key has a subkey `name`
    fn key_exists(&self, name: &str) -> bool;

    /// Returns true if the current key has a value `name`
    fn value_exists(&self, name: &str) -> bool {
        self.read_value(name).is_some()
    }

    /// Raw value lookup
    fn read_value(&self, name: &str) -> Option<StorageValue>;

    /// Stores a raw value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn write_value(&mut self, name: &str, value: StorageValue) -> StorageResult<()>;

    /// Removes a value, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn delete_value(&mut self, name: &str) -> StorageResult<bool>;

    /// Removes a subkey with everything below it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn recursive_delete_sub_key(&mut self, name: &str) -> StorageResult<bool>;

    /// Persists pending changes to the backing store.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the backing store fails.
    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    /// Reads a string
    fn read_string(&self, name: &str, default: &str) -> String {
        self.read_value(name)
            .map_or_else(|| default.to_string(), |value| value.to_text())
    }

    /// Reads an integer
    fn read_integer(&self, name: &str, default: i64) -> i64 {
        self.read_value(name)
            .and_then(|value| value.as_integer())
            .unwrap_or(default)
    }

    /// Reads a boolean
    fn read_bool(&self, name: &str, default: bool) -> bool {
        self.read_value(name)
            .and_then(|value| value.as_bool())
            .unwrap_or(default)
    }

    /// Reads a floating point number
    fn read_float(&self, name: &str, default: f64) -> f64 {
        self.read_value(name)
            .and_then(|value| value.as_float())
            .unwrap_or(default)
    }

    /// Reads binary data stored as a hex string
    fn read_binary(&self, name: &str) -> Option<Vec<u8>> {
        let text = self.read_value(name)?.to_text();
        match hex::decode(text.trim()) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!(value = name, error = %e, "Ignoring malformed binary value");
                None
            }
        }
    }

    /// Writes a string.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn write_string(&mut self, name: &str, value: &str) -> StorageResult<()> {
        self.write_value(name, StorageValue::String(value.to_string()))
    }

    /// Writes an integer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn write_integer(&mut self, name: &str, value: i64) -> StorageResult<()> {
        self.write_value(name, StorageValue::Integer(value))
    }

    /// Writes a boolean.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn write_bool(&mut self, name: &str, value: bool) -> StorageResult<()> {
        self.write_value(name, StorageValue::Bool(value))
    }

    /// Writes a floating point number.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn write_float(&mut self, name: &str, value: f64) -> StorageResult<()> {
        self.write_value(name, StorageValue::Float(value))
    }

    /// Writes binary data as a hex string.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ReadOnly` in read-only mode.
    fn write_binary(&mut self, name: &str, value: &[u8]) -> StorageResult<()> {
        self.write_value(name, StorageValue::String(hex::encode(value)))
    }
}

/// An open subkey, closed again when dropped.
pub struct SubKey<'a, S: HierarchicalStorage + ?Sized> {
    storage: &'a mut S,
}

impl<S: HierarchicalStorage + ?Sized> Deref for SubKey<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.storage
    }
}

impl<S: HierarchicalStorage + ?Sized> DerefMut for SubKey<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.storage
    }
}

impl<S: HierarchicalStorage + ?Sized> Drop for SubKey<'_, S> {
    fn drop(&mut self) {
        self.storage.close_sub_key();
    }
}

/// Opens `name` below the current key and returns a closing guard.
///
/// Returns `Ok(None)` when the key does not exist and cannot be created.
///
/// # Errors
///
/// Returns an error if the backing store fails.
pub fn sub_key<'a, S: HierarchicalStorage + ?Sized>(
    storage: &'a mut S,
    name: &str,
    can_create: bool,
) -> StorageResult<Option<SubKey<'a, S>>> {
    if storage.open_sub_key(name, can_create)? {
        Ok(Some(SubKey { storage }))
    } else {
        Ok(None)
    }
}

/// Characters escaped in subkey names
const KEY_NAME_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'*')
    .add(b'?')
    .add(b'\\')
    .add(b'"');

/// Characters escaped in file names, which additionally cannot hold `/`
const FILE_NAME_ESCAPE: &AsciiSet = &KEY_NAME_ESCAPE.add(b'/').add(b':');

/// Escapes a name for use as a subkey
#[must_use]
pub fn munge_key_name(name: &str) -> String {
    utf8_percent_encode(name, KEY_NAME_ESCAPE).to_string()
}

/// Escapes a name for use as a file name
#[must_use]
pub fn munge_file_name(name: &str) -> String {
    utf8_percent_encode(name, FILE_NAME_ESCAPE).to_string()
}

/// Reverses [`munge_key_name`] and [`munge_file_name`]
#[must_use]
pub fn unmunge_name(name: &str) -> String {
    percent_decode_str(name).decode_utf8_lossy().into_owned()
}
