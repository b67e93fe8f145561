//! Import engine for migrating sites from other tools.
//!
//! This module provides functionality to import sites from:
//! - PuTTY session files (~/.putty/sessions)
//! - FileZilla site manager (sitemanager.xml)
//!
//! Importers produce descriptors only; adding them to a collection is up to
//! [`crate::sessions::StoredSessionList::import_sessions`].

mod filezilla;
mod putty;
mod traits;

pub use filezilla::FileZillaImporter;
pub use putty::PuttyImporter;
pub use traits::{ImportResult, ImportSource, SkippedEntry};
