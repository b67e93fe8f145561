//! Integration tests for collections backed by the configuration directory
//!
//! These tests drive the site collection through `ConfigManager`, the way
//! the command-line interface does.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use xfersite_core::secret::{MasterPasswordCodec, SecretCodec, StaticMasterPassword};
use xfersite_core::storage::{sub_key, AccessMode, HierarchicalStorage};
use xfersite_core::url::SessionOptions;
use xfersite_core::{AppSettings, ConfigManager, MemoryStorageFactory, StoredSessionList};

use crate::fixtures::{all_sample_sites, sample_sftp_site};

fn create_manager() -> (ConfigManager, TempDir) {
    let temp = TempDir::new().unwrap();
    let manager = ConfigManager::with_config_dir(temp.path().join("xfersite"));
    (manager, temp)
}

fn master_list(factory: &MemoryStorageFactory, password: &str) -> StoredSessionList {
    let codec = MasterPasswordCodec::new(Box::new(StaticMasterPassword::new(password)), [7u8; 16]);
    StoredSessionList::with_codec(Arc::new(factory.clone()), Arc::new(codec))
}

fn stored_password(factory: &MemoryStorageFactory, site: &str) -> Vec<u8> {
    let mut storage = factory.storage(AccessMode::ReadOnly);
    let mut sessions = sub_key(&mut storage, "Sessions", false).unwrap().unwrap();
    let site = sub_key(&mut *sessions, site, false).unwrap().unwrap();
    site.read_binary("Password").unwrap_or_default()
}

// ============================================================================
// Profile store in the configuration directory
// ============================================================================

#[test]
fn test_sites_survive_restart() {
    let (manager, _temp) = create_manager();
    let mut settings = AppSettings::default();

    let mut list = manager.session_list(&mut settings).unwrap();
    for data in all_sample_sites() {
        list.new_session(data.name(), &data);
    }
    list.save(false).unwrap();
    assert!(manager.sessions_file().is_file());

    let mut reloaded = manager.session_list(&mut settings).unwrap();
    reloaded.load().unwrap();
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded.find_by_name("work/prod").unwrap().password(), "s3cr3t");
    assert!(reloaded.is_folder("work"));
}

#[test]
fn test_password_storing_disabled_by_settings() {
    let (manager, _temp) = create_manager();
    let mut settings = AppSettings::default();
    settings.security.disable_password_storing = true;

    let mut list = manager.session_list(&mut settings).unwrap();
    list.new_session("work/prod", &sample_sftp_site());
    list.save(false).unwrap();

    let content = fs::read_to_string(manager.sessions_file()).unwrap();
    assert!(content.contains("prod.example.com"));
    assert!(!content.lines().any(|line| line.trim_start().starts_with("Password")));
}

#[test]
fn test_default_settings_seed_resolved_urls() {
    let (manager, _temp) = create_manager();
    let mut settings = AppSettings::default();

    let mut list = manager.session_list(&mut settings).unwrap();
    list.load().unwrap();
    let mut defaults = list.default_settings().clone();
    defaults.set_timeout(77);
    list.set_default_settings(&defaults).unwrap();

    let mut reloaded = manager.session_list(&mut settings).unwrap();
    reloaded.load().unwrap();
    assert_eq!(reloaded.default_settings().timeout(), 77);

    let (data, outcome) = reloaded.parse_url("ftp://anon@mirror.example.org", None, false).unwrap();
    assert!(!outcome.defaults_only);
    assert_eq!(data.timeout(), 77);
    assert_eq!(data.host_name(), "mirror.example.org");
}

#[test]
fn test_resolve_and_save_new_site() {
    let (manager, _temp) = create_manager();
    let mut settings = AppSettings::default();
    let mut list = manager.session_list(&mut settings).unwrap();
    list.load().unwrap();

    let options = SessionOptions::new()
        .with_switch("timeout", Some("30"))
        .with_raw_setting("Compression", "1");
    let (data, _) = list
        .parse_url("sftp://ops:pw@bastion.example.com:2200/etc/", Some(&options), false)
        .unwrap();
    list.new_session("infra/bastion", &data);
    list.save(false).unwrap();

    let mut reloaded = manager.session_list(&mut settings).unwrap();
    reloaded.load().unwrap();
    let bastion = reloaded.find_by_name("infra/bastion").unwrap();
    assert_eq!(bastion.port_number(), 2200);
    assert_eq!(bastion.timeout(), 30);
    assert!(bastion.compression());
    assert_eq!(bastion.password(), "pw");
    assert_eq!(bastion.remote_directory(), "/etc/");

    let (resolved, _) = reloaded.parse_url("infra/bastion/var/log", None, false).unwrap();
    assert_eq!(resolved.host_name(), "bastion.example.com");
    assert_eq!(resolved.remote_directory(), "/var/log");
}

// ============================================================================
// Master password protection
// ============================================================================

#[test]
fn test_recrypt_upgrades_scrambled_passwords() {
    let factory = MemoryStorageFactory::new();
    let mut plain = StoredSessionList::new(Arc::new(factory.clone()));
    plain.new_session("work/prod", &sample_sftp_site());
    plain.save(false).unwrap();

    let mut list = master_list(&factory, "correct horse");
    list.load().unwrap();
    assert!(!list.codec().is_strong(&stored_password(&factory, "work/prod")));

    let failures = list.recrypt_passwords().unwrap();
    assert!(failures.is_empty(), "{failures:?}");
    assert!(list.codec().is_strong(&stored_password(&factory, "work/prod")));

    let mut reloaded = master_list(&factory, "correct horse");
    reloaded.load().unwrap();
    assert_eq!(reloaded.find_by_name("work/prod").unwrap().password(), "s3cr3t");
}

#[test]
fn test_wrong_master_password_hides_secret() {
    let factory = MemoryStorageFactory::new();
    let mut list = master_list(&factory, "correct horse");
    let mut data = list.new_session_data("");
    data.set_host_name("deploy@prod.example.com");
    data.set_password("s3cr3t");
    list.new_session("work/prod", &data);
    list.save(false).unwrap();
    list.recrypt_passwords().unwrap();
    assert!(list.codec().is_strong(&stored_password(&factory, "work/prod")));

    let mut intruder = master_list(&factory, "battery staple");
    intruder.load().unwrap();
    let prod = intruder.find_by_name("work/prod").unwrap();
    assert!(prod.try_password().is_err());
    assert_eq!(prod.host_name(), "prod.example.com");
}

#[test]
fn test_master_password_salt_in_settings() {
    let (manager, _temp) = create_manager();
    let mut settings = AppSettings::default();
    settings.security.use_master_password = true;

    let list = manager.session_list(&mut settings).unwrap();
    assert!(settings.security.master_password_salt.is_some());
    assert!(format!("{:?}", list.codec()).starts_with("MasterPasswordCodec"));

    let reopened = manager.load_settings().unwrap();
    assert_eq!(
        reopened.security.master_password_salt,
        settings.security.master_password_salt
    );
}
