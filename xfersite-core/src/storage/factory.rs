//! Storage factories

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::StorageResult;

use super::{AccessMode, HierarchicalStorage, MemoryStorage, StorageNode};

/// Name of the key holding stored sites
pub const DEFAULT_SESSIONS_SUB_KEY: &str = "Sessions";

/// Hands out storage for the profile store.
pub trait StorageFactory: Send + Sync + fmt::Debug {
    /// Opens the profile store root.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be opened.
    fn create_storage(&self, mode: AccessMode) -> StorageResult<Box<dyn HierarchicalStorage>>;

    /// Key below the root holding stored sites
    fn sessions_sub_key(&self) -> &str {
        DEFAULT_SESSIONS_SUB_KEY
    }
}

/// Factory over a single in-memory tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageFactory {
    root: Arc<Mutex<StorageNode>>,
}

impl MemoryStorageFactory {
    /// Creates a factory with an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A storage over the shared tree
    #[must_use]
    pub fn storage(&self, mode: AccessMode) -> MemoryStorage {
        MemoryStorage::shared(Arc::clone(&self.root), mode)
    }
}

impl StorageFactory for MemoryStorageFactory {
    fn create_storage(&self, mode: AccessMode) -> StorageResult<Box<dyn HierarchicalStorage>> {
        Ok(Box::new(self.storage(mode)))
    }
}
