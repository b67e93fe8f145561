//! Usage statistics of the stored sites

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{FsProtocol, Ftps};

use super::StoredSessionList;

/// Counts describing how the stored sites are configured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatistics {
    /// SCP sites
    pub scp: usize,
    /// SFTP sites
    pub sftp: usize,
    /// Plain FTP sites
    pub ftp: usize,
    /// FTP sites with TLS
    pub ftps: usize,
    /// Plain WebDAV sites
    pub webdav: usize,
    /// WebDAV sites with TLS
    pub webdavs: usize,
    /// Sites with any stored password
    pub password: usize,
    /// Sites with a color tag
    pub color: usize,
    /// Sites with a note
    pub note: usize,
    /// Sites differing from factory defaults in advanced settings
    pub advanced: usize,
    /// Advanced settings customized by any site
    pub advanced_settings: BTreeSet<&'static str>,
    /// Sites connecting through a tunnel
    pub tunnel: usize,
    /// Any site lives in a folder
    pub folders: bool,
    /// Any workspace is stored
    pub workspaces: bool,
    /// The default settings differ from factory defaults
    pub custom_default: bool,
}

impl StoredSessionList {
    /// Collects usage statistics over the visible sites
    pub fn statistics(&self) -> SessionStatistics {
        let factory_defaults = self.new_session_data("");
        let mut stats = SessionStatistics::default();

        for data in self.iter() {
            if data.is_workspace() {
                stats.workspaces = true;
                continue;
            }

            match (data.fs_protocol(), data.ftps()) {
                (FsProtocol::ScpOnly, _) => stats.scp += 1,
                (FsProtocol::Sftp | FsProtocol::SftpOnly, _) => stats.sftp += 1,
                (FsProtocol::Ftp, Ftps::None) => stats.ftp += 1,
                (FsProtocol::Ftp, _) => stats.ftps += 1,
                (FsProtocol::WebDav, Ftps::None) => stats.webdav += 1,
                (FsProtocol::WebDav, _) => stats.webdavs += 1,
            }

            if data.has_any_password() {
                stats.password += 1;
            }
            if data.color() != 0 {
                stats.color += 1;
            }
            if !data.note().is_empty() {
                stats.note += 1;
            }

            let different = data.different_properties(&factory_defaults, true);
            if !different.is_empty() {
                stats.advanced += 1;
                stats.advanced_settings.extend(different);
            }

            if data.tunnel() {
                stats.tunnel += 1;
            }
            if !data.folder_name().is_empty() {
                stats.folders = true;
            }
        }

        stats.custom_default = !self.default_settings().is_same(&factory_defaults, false);
        stats
    }
}
