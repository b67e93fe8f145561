//! Integration tests for export/import round-trip functionality
//!
//! These tests verify that exporting sites and importing them again
//! preserves the connection settings each format can carry.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use xfersite_core::storage::{sub_key, AccessMode, HierarchicalStorage, TomlFileStorage};
use xfersite_core::{
    ExportTarget, FsProtocol, ImportSource, MemoryStorageFactory, PuttyExporter, PuttyImporter,
    SessionData, StoredSessionList,
};

use crate::fixtures::{all_sample_sites, sample_sftp_site};

// ============================================================================
// PuTTY round trip
// ============================================================================

#[test]
fn test_putty_export_import_roundtrip() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("putty");

    let result = PuttyExporter::new().export(&all_sample_sites(), &dir).unwrap();
    assert_eq!(result.exported_count, 2);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.output_files.len(), 2);

    let imported = PuttyImporter::with_paths(vec![dir.clone()]).import().unwrap();
    assert_eq!(imported.sessions.len(), 2);

    let original = sample_sftp_site();
    let prod = imported
        .sessions
        .iter()
        .find(|data| data.host_name() == "prod.example.com")
        .unwrap();
    // folders do not exist in PuTTY, the separator is kept as a backslash
    assert_eq!(prod.name(), "work\\prod");
    assert_eq!(prod.port_number(), original.port_number());
    assert_eq!(prod.user_name(), original.user_name());
    assert!(prod.compression());
    assert!(!prod.has_password());
}

#[test]
fn test_putty_export_file_content() {
    let temp = TempDir::new().unwrap();
    PuttyExporter::new()
        .export(&[sample_sftp_site()], temp.path())
        .unwrap();

    let content = fs::read_to_string(temp.path().join("work%2Fprod")).unwrap();
    assert!(content.lines().any(|line| line == "HostName=prod.example.com"));
    assert!(content.lines().any(|line| line == "Protocol=ssh"));
    assert!(!content.contains("s3cr3t"));
}

// ============================================================================
// Profile store export
// ============================================================================

#[test]
fn test_collection_export_to_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("export").join("sites.toml");

    let factory = MemoryStorageFactory::new();
    let mut list = StoredSessionList::new(Arc::new(factory));
    for data in all_sample_sites() {
        list.new_session(data.name(), &data);
    }
    list.save(false).unwrap();
    list.export(&path).unwrap();

    let mut storage = TomlFileStorage::open(&path, AccessMode::ReadOnly).unwrap();
    let sessions = sub_key(&mut storage, "Sessions", false).unwrap().unwrap();
    let mut names = sessions.sub_key_names();
    names.sort();
    assert_eq!(names.len(), 4);
    assert!(names.iter().any(|name| name == "Default Settings"));
    assert!(sessions.key_exists("files"));
}

#[test]
fn test_exported_store_loads_into_new_collection() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sites.toml");

    let mut list = StoredSessionList::new(Arc::new(MemoryStorageFactory::new()));
    for data in all_sample_sites() {
        list.new_session(data.name(), &data);
    }
    list.export(&path).unwrap();

    let mut storage = TomlFileStorage::open(&path, AccessMode::ReadOnly).unwrap();
    let mut sessions = sub_key(&mut storage, "Sessions", false).unwrap().unwrap();
    let mut restored = StoredSessionList::new(Arc::new(MemoryStorageFactory::new()));
    restored.load_from(&mut *sessions, true, false).unwrap();

    assert_eq!(restored.len(), 3);
    let prod = restored.find_by_name("work/prod").unwrap();
    assert_eq!(prod.fs_protocol(), FsProtocol::Sftp);
    assert_eq!(prod.password(), "s3cr3t");
    assert_eq!(prod.remote_directory(), "/srv/app");
    assert!(prod.is_modified());

    let scp = restored.find_by_name("legacy box").unwrap();
    assert_eq!(scp.fs_protocol(), FsProtocol::ScpOnly);
    assert!(SessionData::validate_name(scp.name()).is_ok());
}
