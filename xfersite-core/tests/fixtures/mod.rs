//! Test fixtures for import/export testing.
//!
//! This module provides sample sites and helper functions shared by the
//! integration tests.

use std::fs;
use std::path::Path;

use xfersite_core::{FsProtocol, Ftps, SessionData};

/// Creates a sample SFTP site with a password.
///
/// This represents a typical production server in a folder with:
/// - Custom port
/// - Stored password
/// - Compression enabled
#[must_use]
pub fn sample_sftp_site() -> SessionData {
    let mut data = SessionData::new("work/prod");
    data.set_fs_protocol(FsProtocol::Sftp);
    data.set_host_name("prod.example.com");
    data.set_port_number(2222);
    data.set_user_name("deploy");
    data.set_password("s3cr3t");
    data.set_compression(true);
    data.set_remote_directory("/srv/app");
    data
}

/// Creates a sample FTPS site using explicit TLS.
#[must_use]
pub fn sample_ftps_site() -> SessionData {
    let mut data = SessionData::new("files");
    data.set_fs_protocol(FsProtocol::Ftp);
    data.set_ftps(Ftps::ExplicitTls);
    data.set_host_name("files.example.com");
    data.set_port_number(21);
    data.set_user_name("uploader");
    data.set_ftp_pasv_mode(true);
    data
}

/// Creates a sample SCP site without credentials.
#[must_use]
pub fn sample_scp_site() -> SessionData {
    let mut data = SessionData::new("legacy box");
    data.set_fs_protocol(FsProtocol::ScpOnly);
    data.set_host_name("10.0.0.7");
    data
}

/// All sample sites
#[must_use]
pub fn all_sample_sites() -> Vec<SessionData> {
    vec![sample_sftp_site(), sample_ftps_site(), sample_scp_site()]
}

/// A FileZilla site manager with nested folders and every logon style
pub const FILEZILLA_SITEMANAGER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes" ?>
<FileZilla3 version="3.66.0" platform="*nix">
    <Servers>
        <Server>
            <Host>mirror.example.org</Host>
            <Port>21</Port>
            <Protocol>0</Protocol>
            <Logontype>0</Logontype>
            <Name>Mirror</Name>
        </Server>
        <Folder expanded="1">Clients
            <Folder expanded="0">Acme
                <Server>
                    <Host>sftp.acme.example</Host>
                    <Port>22</Port>
                    <Protocol>1</Protocol>
                    <Logontype>1</Logontype>
                    <User>acme</User>
                    <Pass encoding="base64">YWNtZS1wYXNz</Pass>
                    <RemoteDir>1 0 4 home 4 acme</RemoteDir>
                    <Name>Acme SFTP</Name>
                </Server>
            </Folder>
            <Server>
                <Host>ftps.globex.example</Host>
                <Port>990</Port>
                <Protocol>3</Protocol>
                <Logontype>1</Logontype>
                <User>globex</User>
                <Pass encoding="base64">Z2xvYmV4</Pass>
                <Name>Globex</Name>
            </Server>
        </Folder>
    </Servers>
</FileZilla3>
"#;

/// Writes PuTTY session files named by their munged session names
pub fn write_putty_sessions(dir: &Path, sessions: &[(&str, &str)]) {
    fs::create_dir_all(dir).expect("create session dir");
    for (file_name, content) in sessions {
        fs::write(dir.join(file_name), content).expect("write session file");
    }
}
