//! Property-based tests for saving and loading site descriptors

use proptest::prelude::*;
use xfersite_core::storage::HierarchicalStorage;
use xfersite_core::{FsProtocol, MemoryStorage, SaveMode, SessionData, SessionPersistence};

// ============================================================================
// Generators
// ============================================================================

/// A descriptor with randomized connection settings
#[derive(Debug, Clone)]
struct SiteSpec {
    name: String,
    host: String,
    user: String,
    password: String,
    port: u16,
    protocol: FsProtocol,
    compression: bool,
    timeout: u32,
    remote_directory: String,
    note: String,
}

impl SiteSpec {
    fn build(&self) -> SessionData {
        let mut data = SessionData::new(self.name.clone());
        data.set_host_name(self.host.clone());
        data.set_user_name(self.user.clone());
        data.set_password(&self.password);
        data.set_port_number(self.port);
        data.set_fs_protocol(self.protocol);
        data.set_compression(self.compression);
        data.set_timeout(self.timeout);
        data.set_remote_directory(self.remote_directory.clone());
        data.set_note(self.note.clone());
        data
    }
}

fn arb_protocol() -> impl Strategy<Value = FsProtocol> {
    prop::sample::select(FsProtocol::ALL.to_vec())
}

fn arb_site() -> impl Strategy<Value = SiteSpec> {
    (
        "[a-z][a-z0-9]{0,8}(/[a-z][a-z0-9]{0,8}){0,2}",
        "[a-z][a-z0-9.-]{0,20}",
        "[a-z0-9_]{0,10}",
        "[ -~]{0,16}",
        1u16..=65535,
        arb_protocol(),
        any::<bool>(),
        1u32..=3600,
        "(/[a-z0-9 ._-]{1,8}){0,3}",
        "[ -~]{0,30}",
    )
        .prop_map(
            |(name, host, user, password, port, protocol, compression, timeout, remote_directory, note)| {
                SiteSpec {
                    name,
                    host,
                    user,
                    password,
                    port,
                    protocol,
                    compression,
                    timeout,
                    remote_directory,
                    note,
                }
            },
        )
}

// ============================================================================
// Round trips
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Saving against factory defaults and loading back restores the site.
    #[test]
    fn prop_save_load_round_trip(spec in arb_site()) {
        let persistence = SessionPersistence::new();
        let original = spec.build();
        let defaults = SessionData::new("");
        let mut storage = MemoryStorage::new();
        persistence
            .save(&original, &mut storage, Some(&defaults), SaveMode::Native)
            .unwrap();

        let mut loaded = SessionData::new(spec.name.clone());
        prop_assert!(persistence.load(&mut loaded, &mut storage).unwrap());
        prop_assert_eq!(loaded.host_name(), spec.host.as_str());
        prop_assert_eq!(loaded.user_name(), spec.user.as_str());
        prop_assert_eq!(loaded.password(), spec.password.clone());
        prop_assert_eq!(loaded.port_number(), spec.port);
        prop_assert_eq!(loaded.fs_protocol(), spec.protocol);
        prop_assert_eq!(loaded.compression(), spec.compression);
        prop_assert_eq!(loaded.timeout(), spec.timeout);
        prop_assert_eq!(loaded.remote_directory(), spec.remote_directory.as_str());
        prop_assert_eq!(loaded.note(), spec.note.as_str());
    }

    /// Only settings differing from the baseline are written.
    #[test]
    fn prop_save_writes_only_differences(port in 1u16..=65535) {
        prop_assume!(port != 22);
        let persistence = SessionPersistence::new();
        let mut data = SessionData::new("site");
        data.set_port_number(port);

        let mut storage = MemoryStorage::new();
        persistence
            .save(&data, &mut storage, Some(&SessionData::new("")), SaveMode::Native)
            .unwrap();
        storage.open_sub_key("site", false).unwrap();
        prop_assert_eq!(storage.value_names(), vec!["PortNumber".to_string()]);
        prop_assert_eq!(storage.read_integer("PortNumber", 0), i64::from(port));
    }

    /// Plaintext saves never carry the session password.
    #[test]
    fn prop_plaintext_save_omits_password(spec in arb_site()) {
        let persistence = SessionPersistence::new();
        let data = spec.build();
        let options = persistence.save_to_options(&data, &SessionData::new(""));
        prop_assert!(options.iter().all(|(name, _)| name != "Password"));

        let mut restored = SessionData::new("");
        persistence.apply_raw_settings(&mut restored, options);
        prop_assert_eq!(restored.host_name(), spec.host.as_str());
        prop_assert_eq!(restored.port_number(), spec.port);
        prop_assert!(!restored.has_password());
    }

    /// Password storing can be switched off entirely.
    #[test]
    fn prop_disabled_password_storing(spec in arb_site()) {
        prop_assume!(!spec.password.is_empty());
        let persistence = SessionPersistence::new().with_password_storing_disabled(true);
        let mut storage = MemoryStorage::new();
        persistence
            .save(&spec.build(), &mut storage, None, SaveMode::Native)
            .unwrap();

        let mut loaded = SessionData::new(spec.name.clone());
        persistence.load(&mut loaded, &mut storage).unwrap();
        prop_assert!(!loaded.has_password());
    }
}
