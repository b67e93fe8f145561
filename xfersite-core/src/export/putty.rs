//! PuTTY session exporter.
//!
//! Writes one `Key=Value` file per site into a PuTTY session directory,
//! readable by [`crate::import::PuttyImporter`].

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::models::SessionData;
use crate::persistence::{SaveMode, SessionPersistence};
use crate::storage::{munge_file_name, MemoryStorage};

use super::{ExportError, ExportOutcome, ExportResult, ExportTarget};

/// Exporter for PuTTY session files
#[derive(Debug, Default)]
pub struct PuttyExporter {
    persistence: SessionPersistence,
}

impl PuttyExporter {
    /// Creates a new PuTTY exporter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            persistence: SessionPersistence::new(),
        }
    }

    /// File name the site is written to
    #[must_use]
    pub fn file_name(data: &SessionData) -> String {
        munge_file_name(&data.session_name())
    }
}

impl ExportTarget for PuttyExporter {
    fn display_name(&self) -> &'static str {
        "PuTTY"
    }

    fn export(&self, sessions: &[SessionData], output: &Path) -> ExportOutcome<ExportResult> {
        if output.exists() && !output.is_dir() {
            return Err(ExportError::InvalidPath(output.display().to_string()));
        }
        fs::create_dir_all(output)?;

        let mut result = ExportResult::new();
        for data in sessions {
            if !data.fs_protocol().is_ssh() {
                result.skip(format!(
                    "{}: {} sites cannot be opened in PuTTY",
                    data.session_name(),
                    data.fs_protocol_str()
                ));
                continue;
            }

            let content = self.export_session(data)?;
            let path = output.join(Self::file_name(data));
            fs::write(&path, content)?;
            debug!(site = %data.session_name(), path = %path.display(), "Exported PuTTY session");
            result.written(path);
        }

        info!(summary = %result.summary(), "PuTTY export finished");
        Ok(result)
    }

    fn export_session(&self, data: &SessionData) -> ExportOutcome<String> {
        let mut storage = MemoryStorage::new();
        self.persistence
            .do_save(data, &mut storage, None, SaveMode::PuttyExport)?;

        let mut content = String::new();
        for (name, value) in storage.pairs() {
            let _ = writeln!(content, "{name}={value}");
        }
        Ok(content)
    }
}
