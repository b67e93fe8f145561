//! Importer interface shared by the PuTTY and FileZilla readers.

use std::path::{Path, PathBuf};

use crate::error::{ImportError, ImportOutcome};
use crate::models::SessionData;

/// Sites read from another tool, plus what could not be taken over
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Sites ready to be added to a collection
    pub sessions: Vec<SessionData>,
    /// Entries left out, with the reason
    pub skipped: Vec<SkippedEntry>,
    /// Files or entries that could not be read at all
    pub errors: Vec<ImportError>,
}

impl ImportResult {
    /// Creates an empty result
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any file or entry failed to read
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// One-line report for logs and the CLI
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} sites imported, {} skipped, {} failed",
            self.sessions.len(),
            self.skipped.len(),
            self.errors.len()
        )
    }

    pub(crate) fn add_session(&mut self, data: SessionData) {
        self.sessions.push(data);
    }

    pub(crate) fn skip(
        &mut self,
        identifier: impl Into<String>,
        reason: impl Into<String>,
        source: &str,
    ) {
        self.skipped.push(SkippedEntry {
            identifier: identifier.into(),
            reason: reason.into(),
            source: source.to_string(),
        });
    }

    pub(crate) fn add_error(&mut self, error: ImportError) {
        self.errors.push(error);
    }

    fn absorb(&mut self, other: Self) {
        self.sessions.extend(other.sessions);
        self.skipped.extend(other.skipped);
        self.errors.extend(other.errors);
    }
}

/// A site the importer left out
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    /// Site or session name as the other tool knows it
    pub identifier: String,
    /// Why it was left out
    pub reason: String,
    /// File or directory the entry came from
    pub source: String,
}

/// A tool whose stored sites can be read.
pub trait ImportSource: Send + Sync {
    /// Short lowercase identifier used in logs
    fn source_id(&self) -> &'static str;

    /// Name shown to users
    fn display_name(&self) -> &'static str;

    /// True if any of the paths to read exists
    fn is_available(&self) -> bool {
        self.default_paths().iter().any(|path| path.exists())
    }

    /// Paths read by [`ImportSource::import`]
    fn default_paths(&self) -> Vec<PathBuf>;

    /// Reads the sites stored at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is missing or unreadable as a whole.
    /// Single bad entries end up in the result instead.
    fn import_from_path(&self, path: &Path) -> ImportOutcome<ImportResult>;

    /// Reads every path of [`ImportSource::default_paths`]
    ///
    /// # Errors
    ///
    /// Returns an error if there is no path to read. A path that fails is
    /// recorded in the result and the others are still read.
    fn import(&self) -> ImportOutcome<ImportResult> {
        let paths = self.default_paths();
        if paths.is_empty() {
            return Err(ImportError::FileNotFound(PathBuf::from(self.source_id())));
        }

        let mut combined = ImportResult::new();
        for path in &paths {
            match self.import_from_path(path) {
                Ok(result) => combined.absorb(result),
                Err(e) => {
                    tracing::warn!(
                        source = self.source_id(),
                        path = %path.display(),
                        error = %e,
                        "Import path failed"
                    );
                    combined.add_error(e);
                }
            }
        }

        tracing::info!(source = self.source_id(), summary = %combined.summary(), "Import finished");
        Ok(combined)
    }
}
