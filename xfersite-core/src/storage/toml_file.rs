//! TOML file backed storage

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{StorageError, StorageResult};

use super::{AccessMode, HierarchicalStorage, MemoryStorage, StorageNode, StorageValue};

/// Storage persisted as a TOML document.
///
/// Keys become tables and values become table entries. The file is read
/// once when opened and rewritten by [`HierarchicalStorage::flush`].
#[derive(Debug)]
pub struct TomlFileStorage {
    path: PathBuf,
    inner: MemoryStorage,
}

impl TomlFileStorage {
    /// Opens `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>, mode: AccessMode) -> StorageResult<Self> {
        let path = path.into();
        let root = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let table: toml::Table = toml::from_str(&content).map_err(|e| StorageError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            node_from_table(&table)
        } else {
            StorageNode::default()
        };

        Ok(Self {
            path,
            inner: MemoryStorage::shared(Arc::new(Mutex::new(root)), mode),
        })
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders the current tree as TOML.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialize` if the tree cannot be rendered.
    pub fn to_toml_string(&self) -> StorageResult<String> {
        toml::to_string_pretty(&table_from_node(&self.inner.snapshot()))
            .map_err(|e| StorageError::Serialize(e.to_string()))
    }
}

fn node_from_table(table: &toml::Table) -> StorageNode {
    let mut node = StorageNode::default();
    for (name, value) in table {
        let converted = match value {
            toml::Value::Table(child) => {
                node.children.insert(name.clone(), node_from_table(child));
                continue;
            }
            toml::Value::String(s) => StorageValue::String(s.clone()),
            toml::Value::Integer(i) => StorageValue::Integer(*i),
            toml::Value::Boolean(b) => StorageValue::Bool(*b),
            toml::Value::Float(f) => StorageValue::Float(*f),
            toml::Value::Datetime(d) => StorageValue::String(d.to_string()),
            toml::Value::Array(_) => {
                tracing::debug!(value = %name, "Ignoring array value in storage file");
                continue;
            }
        };
        node.values.insert(name.clone(), converted);
    }
    node
}

fn table_from_node(node: &StorageNode) -> toml::Table {
    let mut table = toml::Table::new();
    for (name, value) in &node.values {
        let converted = match value {
            StorageValue::String(s) => toml::Value::String(s.clone()),
            StorageValue::Integer(i) => toml::Value::Integer(*i),
            StorageValue::Bool(b) => toml::Value::Boolean(*b),
            StorageValue::Float(f) => toml::Value::Float(*f),
        };
        table.insert(name.clone(), converted);
    }
    for (name, child) in &node.children {
        table.insert(name.clone(), toml::Value::Table(table_from_node(child)));
    }
    table
}

impl HierarchicalStorage for TomlFileStorage {
    fn access_mode(&self) -> AccessMode {
        self.inner.access_mode()
    }

    fn set_access_mode(&mut self, mode: AccessMode) {
        self.inner.set_access_mode(mode);
    }

    fn open_sub_key(&mut self, name: &str, can_create: bool) -> StorageResult<bool> {
        self.inner.open_sub_key(name, can_create)
    }

    fn close_sub_key(&mut self) {
        self.inner.close_sub_key();
    }

    fn sub_key_names(&self) -> Vec<String> {
        self.inner.sub_key_names()
    }

    fn value_names(&self) -> Vec<String> {
        self.inner.value_names()
    }

    fn key_exists(&self, name: &str) -> bool {
        self.inner.key_exists(name)
    }

    fn read_value(&self, name: &str) -> Option<StorageValue> {
        self.inner.read_value(name)
    }

    fn write_value(&mut self, name: &str, value: StorageValue) -> StorageResult<()> {
        self.inner.write_value(name, value)
    }

    fn delete_value(&mut self, name: &str) -> StorageResult<bool> {
        self.inner.delete_value(name)
    }

    fn recursive_delete_sub_key(&mut self, name: &str) -> StorageResult<bool> {
        self.inner.recursive_delete_sub_key(name)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.access_mode() == AccessMode::ReadOnly {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, self.to_toml_string()?)?;
        tracing::debug!(path = %self.path.display(), "Storage file written");
        Ok(())
    }
}
