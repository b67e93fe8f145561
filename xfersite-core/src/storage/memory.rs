//! In-memory storage tree

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{StorageError, StorageResult};

use super::{munge_key_name, unmunge_name, AccessMode, HierarchicalStorage, StorageValue};

/// One key of the tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageNode {
    /// Values of this key
    pub values: BTreeMap<String, StorageValue>,
    /// Subkeys by munged name
    pub children: BTreeMap<String, StorageNode>,
}

impl StorageNode {
    fn find_value_name(&self, name: &str) -> Option<String> {
        if self.values.contains_key(name) {
            return Some(name.to_string());
        }
        self.values
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn find_child_name(&self, munged: &str) -> Option<String> {
        if self.children.contains_key(munged) {
            return Some(munged.to_string());
        }
        self.children
            .keys()
            .find(|key| key.eq_ignore_ascii_case(munged))
            .cloned()
    }

    fn descend(&self, path: &[String]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    fn descend_mut(&mut self, path: &[String]) -> Option<&mut Self> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get_mut(segment))
    }
}

/// Storage kept in memory.
///
/// Clones share the same tree, so a storage handed out by a factory and the
/// factory itself observe each other's writes. Each clone keeps its own
/// open-key path.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    root: Arc<Mutex<StorageNode>>,
    path: Vec<String>,
    mode: AccessMode,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty, writable storage
    #[must_use]
    pub fn new() -> Self {
        Self::shared(Arc::new(Mutex::new(StorageNode::default())), AccessMode::ReadWrite)
    }

    /// Creates a storage over an existing shared tree
    #[must_use]
    pub fn shared(root: Arc<Mutex<StorageNode>>, mode: AccessMode) -> Self {
        Self {
            root,
            path: Vec::new(),
            mode,
        }
    }

    /// Creates a storage holding `pairs` as values of the root key.
    ///
    /// Used to feed `name=value` lists through the regular load path.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut node = StorageNode::default();
        for (name, value) in pairs {
            node.values
                .insert(name.into(), StorageValue::String(value.into()));
        }
        Self::shared(Arc::new(Mutex::new(node)), AccessMode::ReadOnly)
    }

    /// Copy of the whole tree
    #[must_use]
    pub fn snapshot(&self) -> StorageNode {
        self.lock().clone()
    }

    /// The shared tree
    #[must_use]
    pub fn root(&self) -> Arc<Mutex<StorageNode>> {
        Arc::clone(&self.root)
    }

    /// Values of the current key as `(name, text)` pairs
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.with_current(|node| {
            node.values
                .iter()
                .map(|(name, value)| (name.clone(), value.to_text()))
                .collect()
        })
        .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, StorageNode> {
        self.root.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_current<T>(&self, f: impl FnOnce(&StorageNode) -> T) -> Option<T> {
        self.lock().descend(&self.path).map(f)
    }

    fn with_current_mut<T>(
        &self,
        f: impl FnOnce(&mut StorageNode) -> T,
    ) -> StorageResult<T> {
        if self.mode == AccessMode::ReadOnly {
            return Err(StorageError::ReadOnly);
        }
        self.lock()
            .descend_mut(&self.path)
            .map(f)
            .ok_or(StorageError::NoOpenKey)
    }
}

impl HierarchicalStorage for MemoryStorage {
    fn access_mode(&self) -> AccessMode {
        self.mode
    }

    fn set_access_mode(&mut self, mode: AccessMode) {
        self.mode = mode;
    }

    fn open_sub_key(&mut self, name: &str, can_create: bool) -> StorageResult<bool> {
        let munged = munge_key_name(name);
        let existing = self
            .with_current(|node| node.find_child_name(&munged))
            .flatten();

        if let Some(child) = existing {
            self.path.push(child);
            return Ok(true);
        }
        if !can_create || self.mode == AccessMode::ReadOnly {
            return Ok(false);
        }

        self.with_current_mut(|node| {
            node.children.entry(munged.clone()).or_default();
        })?;
        self.path.push(munged);
        Ok(true)
    }

    fn close_sub_key(&mut self) {
        self.path.pop();
    }

    fn sub_key_names(&self) -> Vec<String> {
        self.with_current(|node| node.children.keys().map(|key| unmunge_name(key)).collect())
            .unwrap_or_default()
    }

    fn value_names(&self) -> Vec<String> {
        self.with_current(|node| node.values.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn key_exists(&self, name: &str) -> bool {
        let munged = munge_key_name(name);
        self.with_current(|node| node.find_child_name(&munged).is_some())
            .unwrap_or(false)
    }

    fn read_value(&self, name: &str) -> Option<StorageValue> {
        self.with_current(|node| {
            node.find_value_name(name)
                .and_then(|key| node.values.get(&key).cloned())
        })
        .flatten()
    }

    fn write_value(&mut self, name: &str, value: StorageValue) -> StorageResult<()> {
        self.with_current_mut(|node| {
            let key = node.find_value_name(name).unwrap_or_else(|| name.to_string());
            node.values.insert(key, value);
        })
    }

    fn delete_value(&mut self, name: &str) -> StorageResult<bool> {
        self.with_current_mut(|node| {
            node.find_value_name(name)
                .and_then(|key| node.values.remove(&key))
                .is_some()
        })
    }

    fn recursive_delete_sub_key(&mut self, name: &str) -> StorageResult<bool> {
        let munged = munge_key_name(name);
        self.with_current_mut(|node| {
            node.find_child_name(&munged)
                .and_then(|key| node.children.remove(&key))
                .is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_case_insensitive() {
        let mut storage = MemoryStorage::new();
        storage.write_integer("PortNumber", 2222).unwrap();
        assert_eq!(storage.read_integer("portnumber", 22), 2222);
        storage.write_integer("PORTNUMBER", 22).unwrap();
        assert_eq!(storage.value_names(), vec!["PortNumber".to_string()]);
        assert!(storage.delete_value("portNumber").unwrap());
        assert!(!storage.value_exists("PortNumber"));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let mut storage = MemoryStorage::new();
        storage.set_access_mode(AccessMode::ReadOnly);
        assert!(matches!(
            storage.write_string("a", "b"),
            Err(StorageError::ReadOnly)
        ));
        assert!(!storage.open_sub_key("x", true).unwrap());
    }

    #[test]
    fn test_clones_share_tree() {
        let mut writer = MemoryStorage::new();
        let reader = writer.clone();
        writer.open_sub_key("Sessions", true).unwrap();
        writer.open_sub_key("a/b c", true).unwrap();
        writer.close_sub_key();
        writer.close_sub_key();

        let mut reader = reader;
        assert!(reader.open_sub_key("Sessions", false).unwrap());
        assert_eq!(reader.sub_key_names(), vec!["a/b c".to_string()]);
    }

    #[test]
    fn test_binary_values_use_hex() {
        let mut storage = MemoryStorage::new();
        storage.write_binary("Password", &[0x01, 0xff]).unwrap();
        assert_eq!(storage.read_string("Password", ""), "01ff");
        assert_eq!(storage.read_binary("Password"), Some(vec![0x01, 0xff]));
        storage.write_string("Password", "zz").unwrap();
        assert_eq!(storage.read_binary("Password"), None);
    }

    #[test]
    fn test_recursive_delete() {
        let mut storage = MemoryStorage::new();
        storage.open_sub_key("Sessions", true).unwrap();
        storage.open_sub_key("site", true).unwrap();
        storage.write_string("HostName", "h").unwrap();
        storage.close_sub_key();
        assert!(storage.recursive_delete_sub_key("SITE").unwrap());
        assert!(storage.sub_key_names().is_empty());
    }
}
