//! Export module for writing sites to external formats.
//!
//! The native profile store export lives on
//! [`crate::sessions::StoredSessionList::export`]; this module covers
//! formats of other tools.

pub mod putty;

use std::path::{Path, PathBuf};

pub use putty::PuttyExporter;

use thiserror::Error;

use crate::error::StorageError;
use crate::models::SessionData;

/// What an export wrote and what it left out
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Sites written
    pub exported_count: usize,
    /// Sites the target format cannot hold
    pub skipped_count: usize,
    /// One line per skipped site
    pub warnings: Vec<String>,
    /// Files written, one per site for per-site formats
    pub output_files: Vec<PathBuf>,
}

impl ExportResult {
    /// Creates an empty result
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line report for logs and the CLI
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} sites exported, {} skipped",
            self.exported_count, self.skipped_count
        )
    }

    pub(crate) fn written(&mut self, path: PathBuf) {
        self.output_files.push(path);
        self.exported_count += 1;
    }

    pub(crate) fn skip(&mut self, warning: String) {
        self.warnings.push(warning);
        self.skipped_count += 1;
    }
}

/// Export failures
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output exists and is not a directory
    #[error("Not a directory: {0}")]
    InvalidPath(String),

    /// A site could not be rendered
    #[error("Cannot render site: {0}")]
    Storage(#[from] StorageError),

    /// Writing the output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for exporters
pub type ExportOutcome<T> = std::result::Result<T, ExportError>;

/// A tool format sites can be written in.
pub trait ExportTarget: Send + Sync {
    /// Name shown to users
    fn display_name(&self) -> &'static str;

    /// Exports `sessions` below `output`
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn export(&self, sessions: &[SessionData], output: &Path) -> ExportOutcome<ExportResult>;

    /// Renders a single site as the content of its output file
    ///
    /// # Errors
    ///
    /// Returns an error if the site cannot be rendered.
    fn export_session(&self, data: &SessionData) -> ExportOutcome<String>;
}
