//! Loading and saving session descriptors
//!
//! [`SessionPersistence`] maps a [`SessionData`] onto a subkey of a
//! [`HierarchicalStorage`]. Most settings are handled generically from the
//! property table; a handful with historical storage quirks (split ping
//! interval, proxy command sharing one key, plaintext secrets written by
//! older versions) get dedicated code.
//!
//! Saving against a baseline deletes every key whose value equals the
//! baseline's, which keeps stored profiles down to what the user changed.

mod secrets;
mod site;

pub use site::{key_type_from_fingerprint, SSH_HOST_KEYS_SUB_KEY};

use crate::error::StorageResult;
use crate::models::{
    AutoSwitch, Conversion, FsProtocol, Persist, Property, PropertyValue, ProxyMethod,
    SessionData, SessionSource, SshBug, PROPERTIES,
};
use crate::storage::{sub_key, AccessMode, HierarchicalStorage, MemoryStorage};

const DEFAULT_PING_INTERVAL: u32 = 30;
const SECS_PER_MIN: u32 = 60;
const LEGACY_LISTING_COMMAND: &str = "ls -gla";
const PROXY_COMMAND_KEY: &str = "ProxyTelnetCommand";

/// Keys older versions wrote that are removed whenever a site is saved
const OBSOLETE_KEYS: &[&str] = &[
    "PingIntervalSec",
    "TryGSSKEX",
    "UserNameFromEnvironment",
    "GSSAPIServerChoosesUserName",
    "GSSAPITrustDNS",
    "BuggyMAC",
    "AliasGroupList",
    "SFTPUtfBug",
];

/// Table keys understood by PuTTY
const PUTTY_KEYS: &[&str] = &[
    "HostName",
    "PortNumber",
    "UserName",
    "PublicKeyFile",
    "Timeout",
    "TryAgent",
    "AgentFwd",
    "AuthTIS",
    "AuthKI",
    "AuthKIPassword",
    "AuthGSSAPI",
    "GSSAPIFwdTGT",
    "GSSAPIServerRealm",
    "ChangeUsername",
    "Compression",
    "SshProt",
    "Ssh2DES",
    "SshNoUserAuth",
    "Cipher",
    "KEX",
    "AddressFamily",
    "RekeyBytes",
    "RekeyTime",
    "TcpNoDelay",
    "ProxyMethod",
    "ProxyHost",
    "ProxyPort",
    "ProxyUsername",
    "ProxyDNS",
    "ProxyLocalhost",
];

/// Legacy Kerberos keys PuTTY still reads, paired with their current names
const PUTTY_KERBEROS_DUPLICATES: &[(&str, &str)] = &[
    ("AuthSSPI", "AuthGSSAPI"),
    ("SSPIFwdTGT", "GSSAPIFwdTGT"),
    ("KerbPrincipal", "GSSAPIServerRealm"),
];

/// Target of a save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// The profile store: every setting, secrets encrypted
    #[default]
    Native,
    /// A PuTTY session: only settings PuTTY knows, no session password
    PuttyExport,
    /// Transient `name=value` lists: secondary secrets in plaintext, no
    /// session password
    Plaintext,
}

/// Reads and writes descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPersistence {
    disable_password_storing: bool,
}

impl SessionPersistence {
    /// Creates a codec that stores passwords
    #[must_use]
    pub const fn new() -> Self {
        Self {
            disable_password_storing: false,
        }
    }

    /// Never read or write session passwords when `disabled`
    #[must_use]
    pub const fn with_password_storing_disabled(mut self, disabled: bool) -> Self {
        self.disable_password_storing = disabled;
        self
    }

    /// Returns true if session passwords are kept out of storage
    #[must_use]
    pub const fn password_storing_disabled(&self) -> bool {
        self.disable_password_storing
    }

    /// Loads `data` from its subkey below the current key.
    ///
    /// Returns `Ok(false)` when there is no such subkey. Secrets found in
    /// plaintext are written back encrypted; failing to do so is logged and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns an error only if opening the subkey fails.
    pub fn load(
        &self,
        data: &mut SessionData,
        storage: &mut dyn HierarchicalStorage,
    ) -> StorageResult<bool> {
        let key = data.internal_storage_key();
        let rewrite = {
            let Some(sub) = sub_key(storage, &key, false)? else {
                return Ok(false);
            };
            data.clear_session_passwords();
            data.proxy_password.clear();
            self.do_load(data, &*sub)
        };

        if rewrite {
            self.rewrite_plaintext_secrets(data, storage, &key);
        }

        data.set_modified(false);
        data.set_source(SessionSource::Stored);
        Ok(true)
    }

    /// Reads every setting from the current key.
    ///
    /// Missing or unreadable values keep the descriptor's current value.
    /// Returns true if a secret was stored in plaintext and should be
    /// rewritten.
    pub fn do_load(&self, data: &mut SessionData, storage: &dyn HierarchicalStorage) -> bool {
        for property in PROPERTIES
            .iter()
            .filter(|property| property.persist != Persist::Custom)
        {
            let value = read_property(storage, property, property.value(data));
            property.assign(data, value);
        }

        load_ping_interval(data, storage);
        load_time_difference(data, storage);

        let listing_default = if storage.read_bool("AliasGroupList", false) {
            LEGACY_LISTING_COMMAND.to_string()
        } else {
            data.listing_command().to_string()
        };
        data.set_listing_command(storage.read_string("ListingCommand", &listing_default));

        if data.proxy_method() == ProxyMethod::Command {
            let command = storage.read_string(PROXY_COMMAND_KEY, data.proxy_local_command());
            data.set_proxy_local_command(command);
        } else {
            let command = storage.read_string(PROXY_COMMAND_KEY, data.proxy_telnet_command());
            data.set_proxy_telnet_command(command);
        }

        if data.bug(SshBug::Hmac2) == AutoSwitch::Auto && storage.read_bool("BuggyMAC", false) {
            data.set_bug(SshBug::Hmac2, AutoSwitch::On);
        }

        self.load_secrets(data, storage)
    }

    /// Saves `data` into its subkey below the current key, creating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects a write.
    pub fn save(
        &self,
        data: &SessionData,
        storage: &mut dyn HierarchicalStorage,
        baseline: Option<&SessionData>,
        mode: SaveMode,
    ) -> StorageResult<()> {
        if let Some(mut sub) = sub_key(storage, &data.internal_storage_key(), true)? {
            self.do_save(data, &mut *sub, baseline, mode)?;
        }
        Ok(())
    }

    /// Writes every setting into the current key.
    ///
    /// With a `baseline`, settings equal to it are deleted instead of written.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects a write.
    pub fn do_save(
        &self,
        data: &SessionData,
        storage: &mut dyn HierarchicalStorage,
        baseline: Option<&SessionData>,
        mode: SaveMode,
    ) -> StorageResult<()> {
        for property in PROPERTIES
            .iter()
            .filter(|property| property.persist == Persist::Table)
        {
            if mode == SaveMode::PuttyExport && !is_putty_property(property) {
                continue;
            }
            write_diff(
                storage,
                property.key,
                property.conversion,
                property.value(data),
                baseline.map(|base| property.value(base)),
            )?;
            if mode != SaveMode::PuttyExport {
                for fallback in property.fallbacks {
                    storage.delete_value(fallback)?;
                }
            }
        }

        let ping = data.ping_interval();
        let base_ping = baseline.map(SessionData::ping_interval);
        write_diff(
            storage,
            "PingInterval",
            Conversion::Identity,
            PropertyValue::Int(i64::from(ping / SECS_PER_MIN)),
            base_ping.map(|p| PropertyValue::Int(i64::from(p / SECS_PER_MIN))),
        )?;
        write_diff(
            storage,
            "PingIntervalSecs",
            Conversion::Identity,
            PropertyValue::Int(i64::from(ping % SECS_PER_MIN)),
            base_ping.map(|p| PropertyValue::Int(i64::from(p % SECS_PER_MIN))),
        )?;

        let (command, base_command) = if data.proxy_method() == ProxyMethod::Command {
            (
                data.proxy_local_command(),
                baseline.map(SessionData::proxy_local_command),
            )
        } else {
            (
                data.proxy_telnet_command(),
                baseline.map(SessionData::proxy_telnet_command),
            )
        };
        write_diff(
            storage,
            PROXY_COMMAND_KEY,
            Conversion::Identity,
            PropertyValue::Str(command.to_string()),
            base_command.map(|c| PropertyValue::Str(c.to_string())),
        )?;

        if mode == SaveMode::PuttyExport {
            for (legacy, current) in PUTTY_KERBEROS_DUPLICATES {
                if let Some(property) = PROPERTIES.iter().find(|p| p.key == *current) {
                    write_diff(
                        storage,
                        legacy,
                        Conversion::Identity,
                        property.value(data),
                        baseline.map(|base| property.value(base)),
                    )?;
                }
            }
            storage.write_string("Protocol", &data.normalized_putty_protocol())?;
        } else {
            if data.time_difference_auto() && data.fs_protocol() == FsProtocol::Ftp {
                storage.delete_value("TimeDifference")?;
            } else {
                write_diff(
                    storage,
                    "TimeDifference",
                    Conversion::Identity,
                    PropertyValue::Float(data.time_difference()),
                    baseline.map(|base| PropertyValue::Float(base.time_difference())),
                )?;
            }
            write_diff(
                storage,
                "TimeDifferenceAuto",
                Conversion::Identity,
                PropertyValue::Bool(data.time_difference_auto()),
                baseline.map(|base| PropertyValue::Bool(base.time_difference_auto())),
            )?;
            write_diff(
                storage,
                "ListingCommand",
                Conversion::Identity,
                PropertyValue::Str(data.listing_command().to_string()),
                baseline.map(|base| PropertyValue::Str(base.listing_command().to_string())),
            )?;
        }

        for key in OBSOLETE_KEYS {
            storage.delete_value(key)?;
        }

        self.save_passwords(data, storage, mode)
    }

    /// Renders every non-default setting as `name=value` pairs.
    ///
    /// The result feeds back through [`SessionPersistence::apply_raw_settings`].
    #[must_use]
    pub fn save_to_options(&self, data: &SessionData, defaults: &SessionData) -> Vec<(String, String)> {
        let mut storage = MemoryStorage::new();
        if let Err(e) = self.do_save(data, &mut storage, Some(defaults), SaveMode::Plaintext) {
            tracing::warn!(site = %data.session_name(), error = %e, "Cannot render site settings");
        }
        storage.pairs()
    }

    /// Applies `name=value` pairs as if loaded from storage
    pub fn apply_raw_settings<K, V>(&self, data: &mut SessionData, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let storage = MemoryStorage::from_pairs(pairs);
        self.do_load(data, &storage);
    }
}

fn is_putty_property(property: &Property) -> bool {
    property.key.starts_with("Bug") || PUTTY_KEYS.contains(&property.key)
}

fn load_ping_interval(data: &mut SessionData, storage: &dyn HierarchicalStorage) {
    let current = data.ping_interval();
    let minutes = storage.read_integer("PingInterval", i64::from(current / SECS_PER_MIN));
    let seconds = storage.read_integer(
        "PingIntervalSecs",
        storage.read_integer("PingIntervalSec", i64::from(current % SECS_PER_MIN)),
    );
    let total = minutes
        .saturating_mul(i64::from(SECS_PER_MIN))
        .saturating_add(seconds);
    let interval = u32::try_from(total)
        .ok()
        .filter(|&interval| interval > 0)
        .unwrap_or(DEFAULT_PING_INTERVAL);
    data.set_ping_interval(interval);
}

fn load_time_difference(data: &mut SessionData, storage: &dyn HierarchicalStorage) {
    let difference = storage.read_float("TimeDifference", data.time_difference());
    data.set_time_difference(difference);
    let auto = storage.read_bool("TimeDifferenceAuto", difference.abs() < f64::EPSILON);
    data.set_time_difference_auto(auto);
}

/// Reads `property`, consulting its fallback keys innermost first
fn read_property(
    storage: &dyn HierarchicalStorage,
    property: &Property,
    current: PropertyValue,
) -> PropertyValue {
    property
        .fallbacks
        .iter()
        .rev()
        .chain(std::iter::once(&property.key))
        .fold(current, |value, key| {
            read_typed(storage, key, property.conversion, value)
        })
}

fn read_typed(
    storage: &dyn HierarchicalStorage,
    key: &str,
    conversion: Conversion,
    default: PropertyValue,
) -> PropertyValue {
    match default {
        PropertyValue::Str(s) => PropertyValue::Str(storage.read_string(key, &s)),
        PropertyValue::Int(i) => PropertyValue::Int(
            conversion.from_stored(storage.read_integer(key, conversion.to_stored(i))),
        ),
        PropertyValue::Bool(b) => PropertyValue::Bool(storage.read_bool(key, b)),
        PropertyValue::Float(f) => PropertyValue::Float(storage.read_float(key, f)),
    }
}

/// Writes `value` under `key`, or deletes the key when it equals `base`
fn write_diff(
    storage: &mut dyn HierarchicalStorage,
    key: &str,
    conversion: Conversion,
    value: PropertyValue,
    base: Option<PropertyValue>,
) -> StorageResult<()> {
    if base.as_ref() == Some(&value) {
        storage.delete_value(key)?;
        return Ok(());
    }
    match value {
        PropertyValue::Str(s) => storage.write_string(key, &s),
        PropertyValue::Int(i) => storage.write_integer(key, conversion.to_stored(i)),
        PropertyValue::Bool(b) => storage.write_bool(key, b),
        PropertyValue::Float(f) => storage.write_float(key, f),
    }
}

impl SessionPersistence {
    fn rewrite_plaintext_secrets(
        &self,
        data: &SessionData,
        storage: &mut dyn HierarchicalStorage,
        key: &str,
    ) {
        let mode = storage.access_mode();
        storage.set_access_mode(AccessMode::ReadWrite);
        match self.write_loaded_secrets(data, storage, key) {
            Ok(()) => tracing::info!(site = %data.session_name(), "Encrypted secrets stored in plaintext"),
            Err(e) => tracing::warn!(
                site = %data.session_name(),
                error = %e,
                "Cannot rewrite plaintext secrets"
            ),
        }
        storage.set_access_mode(mode);
    }

    fn write_loaded_secrets(
        &self,
        data: &SessionData,
        storage: &mut dyn HierarchicalStorage,
        key: &str,
    ) -> StorageResult<()> {
        if let Some(mut sub) = sub_key(storage, key, true)? {
            secrets::write_encrypted(data, &mut *sub, self.disable_password_storing)?;
        }
        storage.flush()
    }
}
