//! Integration tests for import functionality
//!
//! These tests verify that importers can handle real-world data files
//! and edge cases correctly.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use xfersite_core::error::ImportError;
use xfersite_core::{
    FileZillaImporter, FsProtocol, Ftps, ImportSource, MemoryStorageFactory, PuttyImporter,
    SessionData, StoredSessionList,
};

use crate::fixtures::{write_putty_sessions, FILEZILLA_SITEMANAGER};

// ============================================================================
// PuTTY Import Integration Tests
// ============================================================================

#[test]
fn test_putty_import_session_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("sessions");
    write_putty_sessions(
        &dir,
        &[
            (
                "Web%20Server",
                "HostName=web.example.com\nPortNumber=2200\nUserName=www\nProtocol=ssh\n",
            ),
            ("Router", "HostName=192.168.0.1\nProtocol=telnet\n"),
            ("Default%20Settings", "HostName=ignored.example.com\n"),
            ("Empty", "PortNumber=22\n"),
        ],
    );

    let importer = PuttyImporter::with_paths(vec![dir.clone()]);
    let result = importer.import_from_path(&dir).unwrap();

    let names: Vec<&str> = result.sessions.iter().map(SessionData::name).collect();
    assert_eq!(names, vec!["Router", "Web Server"]);
    let web = &result.sessions[1];
    assert_eq!(web.host_name(), "web.example.com");
    assert_eq!(web.port_number(), 2200);
    assert_eq!(web.user_name(), "www");
    assert!(result.skipped.iter().any(|entry| entry.identifier == "Empty"));
    assert!(!result.has_errors());
}

#[test]
fn test_putty_import_ssh_only() {
    let temp = TempDir::new().unwrap();
    write_putty_sessions(
        temp.path(),
        &[
            ("shell", "HostName=shell.example.com\nProtocol=ssh\n"),
            ("serial", "HostName=com1\nProtocol=serial\n"),
        ],
    );

    let importer = PuttyImporter::with_paths(vec![temp.path().to_path_buf()]).with_ssh_only(true);
    let result = importer.import().unwrap();
    assert_eq!(result.sessions.len(), 1);
    assert_eq!(result.sessions[0].name(), "shell");
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].identifier, "serial");
}

#[test]
fn test_putty_import_missing_directory() {
    let importer = PuttyImporter::with_paths(vec![PathBuf::from("/nonexistent/putty")]);
    assert!(!importer.is_available());
    assert!(matches!(
        importer.import_from_path(&PathBuf::from("/nonexistent/putty")),
        Err(ImportError::FileNotFound(_))
    ));
}

// ============================================================================
// FileZilla Import Integration Tests
// ============================================================================

#[test]
fn test_filezilla_import_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sitemanager.xml");
    fs::write(&path, FILEZILLA_SITEMANAGER).unwrap();

    let importer = FileZillaImporter::with_paths(vec![path.clone()]);
    assert!(importer.is_available());
    let result = importer.import().unwrap();
    assert_eq!(result.sessions.len(), 3);
    assert!(result.skipped.is_empty());

    let names: Vec<&str> = result.sessions.iter().map(SessionData::name).collect();
    assert!(names.contains(&"Mirror"));
    assert!(names.contains(&"Clients/Acme/Acme SFTP"));
    assert!(names.contains(&"Clients/Globex"));

    let acme = result
        .sessions
        .iter()
        .find(|data| data.name() == "Clients/Acme/Acme SFTP")
        .unwrap();
    assert_eq!(acme.fs_protocol(), FsProtocol::Sftp);
    assert_eq!(acme.password(), "acme-pass");
    assert_eq!(acme.remote_directory(), "/home/acme");

    let globex = result
        .sessions
        .iter()
        .find(|data| data.name() == "Clients/Globex")
        .unwrap();
    assert_eq!(globex.ftps(), Ftps::Implicit);
    assert_eq!(globex.port_number(), 990);
    assert_eq!(globex.password(), "globex");
}

#[test]
fn test_filezilla_import_malformed_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sitemanager.xml");
    fs::write(&path, "<FileZilla3><Servers><Server><Host>x</Servers>").unwrap();

    let result = FileZillaImporter::new().import_from_path(&path);
    match result {
        Ok(result) => assert!(result.has_errors() || result.sessions.is_empty()),
        Err(e) => assert!(matches!(e, ImportError::ParseError { .. })),
    }
}

// ============================================================================
// Importing into a collection
// ============================================================================

#[test]
fn test_imported_sites_join_collection() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sitemanager.xml");
    fs::write(&path, FILEZILLA_SITEMANAGER).unwrap();

    let factory = MemoryStorageFactory::new();
    let mut list = StoredSessionList::new(Arc::new(factory.clone()));
    let mut existing = SessionData::new("Mirror");
    existing.set_host_name("old-mirror.example.org");
    list.new_session("Mirror", &existing);
    list.save(false).unwrap();

    let importer =
        FileZillaImporter::with_paths(vec![path]).with_defaults(list.default_settings().clone());
    let result = importer.import().unwrap();
    let names = list.import_sessions(result.sessions).unwrap();
    assert!(names.contains(&"Mirror (1)".to_string()));

    let mut reloaded = StoredSessionList::new(Arc::new(factory));
    reloaded.load().unwrap();
    assert_eq!(reloaded.len(), 4);
    assert_eq!(
        reloaded.find_by_name("Mirror").unwrap().host_name(),
        "old-mirror.example.org"
    );
    assert_eq!(
        reloaded.find_by_name("Mirror (1)").unwrap().host_name(),
        "mirror.example.org"
    );
    assert_eq!(
        reloaded.find_by_name("clients/acme/acme sftp").unwrap().password(),
        "acme-pass"
    );
}
