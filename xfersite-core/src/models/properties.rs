//! Declarative table of descriptor properties
//!
//! Every setting of a [`SessionData`] is listed once here with its storage
//! key, legacy fallback keys, comparison group and how it is persisted. The
//! generic load, save and comparison routines walk this table instead of
//! repeating per-field code.

use super::protocol::{
    AddressFamily, AutoSwitch, DstMode, EolType, FsProtocol, Ftps, PingType, ProxyMethod,
    SftpBug, SshBug, SshProt, TlsVersion,
};
use super::session::SessionData;

/// A property value in loosely typed form
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Text
    Str(String),
    /// Integer, also used for enumerations
    Int(i64),
    /// Flag
    Bool(bool),
    /// Floating point number
    Float(f64),
}

/// Comparison group of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyGroup {
    /// Settings shown on the login page
    Base,
    /// Settings from the advanced dialog
    Advanced,
    /// Workspace bookkeeping
    Meta,
}

/// How the generic persistence code treats a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Persist {
    /// Loaded and saved by the table
    Table,
    /// Loaded by the table, never written
    LoadOnly,
    /// Only compared, persisted by dedicated code
    Custom,
}

/// Transformation between the in-memory and the stored integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conversion {
    Identity,
    /// PuTTY bug switches: stored as `2 - value`
    InvertTriState,
    /// PuTTY proxy DNS: stored as `(value + 2) % 3`
    ProxyDns,
}

impl Conversion {
    pub(crate) const fn to_stored(self, value: i64) -> i64 {
        match self {
            Self::Identity => value,
            Self::InvertTriState => 2 - value,
            Self::ProxyDns => (value + 2) % 3,
        }
    }

    pub(crate) const fn from_stored(self, value: i64) -> i64 {
        match self {
            Self::Identity => value,
            Self::InvertTriState => 2 - value,
            Self::ProxyDns => (value + 1).rem_euclid(3),
        }
    }
}

/// One row of the property table
pub struct Property {
    /// Property name, used in difference reports
    pub name: &'static str,
    /// Storage key
    pub key: &'static str,
    /// Legacy keys consulted in order when `key` is absent
    pub fallbacks: &'static [&'static str],
    /// Comparison group
    pub group: PropertyGroup,
    pub(crate) persist: Persist,
    pub(crate) conversion: Conversion,
    pub(crate) get: fn(&SessionData) -> PropertyValue,
    pub(crate) set: fn(&mut SessionData, PropertyValue),
}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl Property {
    /// Current value of the property in `data`
    #[must_use]
    pub fn value(&self, data: &SessionData) -> PropertyValue {
        (self.get)(data)
    }

    /// Assigns a value; values of the wrong shape are ignored
    pub fn assign(&self, data: &mut SessionData, value: PropertyValue) {
        (self.set)(data, value);
    }
}

macro_rules! property {
    (@key $name:literal) => { $name };
    (@key $name:literal $key:literal) => { $key };
    (@row $group:ident $persist:ident $conv:ident $name:literal $($key:literal)? [$($fb:literal),*], $get:expr, $set:expr) => {
        Property {
            name: $name,
            key: property!(@key $name $($key)?),
            fallbacks: &[$($fb),*],
            group: PropertyGroup::$group,
            persist: Persist::$persist,
            conversion: Conversion::$conv,
            get: $get,
            set: $set,
        }
    };
    (text $group:ident $persist:ident $name:literal $(=> $key:literal)? $([$($fb:literal),*])?, $field:ident, $setter:ident) => {
        property!(@row $group $persist Identity $name $($key)? [$($($fb),*)?],
            |d| PropertyValue::Str(d.$field().to_string()),
            |d, v| if let PropertyValue::Str(v) = v { d.$setter(v) })
    };
    (flag $group:ident $persist:ident $name:literal $(=> $key:literal)? $([$($fb:literal),*])?, $field:ident, $setter:ident) => {
        property!(@row $group $persist Identity $name $($key)? [$($($fb),*)?],
            |d| PropertyValue::Bool(d.$field()),
            |d, v| if let PropertyValue::Bool(v) = v { d.$setter(v) })
    };
    (number $group:ident $persist:ident $name:literal $(=> $key:literal)? $([$($fb:literal),*])?, $field:ident, $setter:ident) => {
        property!(@row $group $persist Identity $name $($key)? [$($($fb),*)?],
            |d| PropertyValue::Int(i64::from(d.$field())),
            |d, v| if let PropertyValue::Int(v) = v {
                if let Ok(v) = v.try_into() { d.$setter(v) }
            })
    };
    (choice $group:ident $persist:ident $conv:ident $name:literal $(=> $key:literal)? $([$($fb:literal),*])?, $ty:ident, $field:ident, $setter:ident) => {
        property!(@row $group $persist $conv $name $($key)? [$($($fb),*)?],
            |d| PropertyValue::Int(d.$field().index()),
            |d, v| if let PropertyValue::Int(v) = v {
                if let Some(v) = $ty::from_index(v) { d.$setter(v) }
            })
    };
    (bug $name:literal, $bug:expr) => {
        property!(@row Advanced Table InvertTriState $name [],
            |d| PropertyValue::Int(d.bug($bug).index()),
            |d, v| if let PropertyValue::Int(v) = v {
                if let Some(v) = AutoSwitch::from_index(v) { d.set_bug($bug, v) }
            })
    };
    (sftp_bug $name:literal, $bug:expr) => {
        property!(@row Advanced Table Identity $name [],
            |d| PropertyValue::Int(d.sftp_bug($bug).index()),
            |d, v| if let PropertyValue::Int(v) = v {
                if let Some(v) = AutoSwitch::from_index(v) { d.set_sftp_bug($bug, v) }
            })
    };
}

/// All properties in load order
pub static PROPERTIES: &[Property] = &[
    // identity of the server comes first, secrets are keyed by it
    property!(number Base Table "PortNumber", port_number, set_port_number),
    property!(text Base Table "UserName", user_name, set_user_name),
    property!(text Base Table "HostName", host_name, set_host_name),
    property!(@row Base Custom Identity "Password" [],
        |d| PropertyValue::Str(d.password()),
        |d, v| if let PropertyValue::Str(v) = v { d.set_password(&v) }),
    property!(text Base Table "PublicKeyFile", public_key_file, set_public_key_file),
    property!(@row Base Custom Identity "Passphrase" [],
        |d| PropertyValue::Str(d.passphrase()),
        |d, v| if let PropertyValue::Str(v) = v { d.set_passphrase(&v) }),
    property!(choice Base Table Identity "FSProtocol", FsProtocol, fs_protocol, set_fs_protocol),
    property!(text Base Table "LocalDirectory", local_directory, set_local_directory),
    property!(text Base Table "RemoteDirectory", remote_directory, set_remote_directory),
    property!(flag Base Table "SynchronizeBrowsing", synchronize_browsing, set_synchronize_browsing),
    property!(flag Advanced Table "UpdateDirectories", update_directories, set_update_directories),
    property!(flag Advanced Table "CacheDirectories", cache_directories, set_cache_directories),
    property!(flag Advanced Table "CacheDirectoryChanges", cache_directory_changes, set_cache_directory_changes),
    property!(flag Advanced Table "PreserveDirectoryChanges", preserve_directory_changes, set_preserve_directory_changes),
    property!(flag Advanced Table "ResolveSymlinks", resolve_symlinks, set_resolve_symlinks),
    property!(choice Advanced Table Identity "DSTMode" => "ConsiderDST", DstMode, dst_mode, set_dst_mode),
    property!(flag Advanced Table "LockInHome", lock_in_home, set_lock_in_home),
    property!(flag Advanced LoadOnly "Special", special, set_special),
    property!(text Advanced Table "Shell", shell, set_shell),
    property!(flag Advanced Table "ClearAliases", clear_aliases, set_clear_aliases),
    property!(flag Advanced Table "UnsetNationalVars", unset_national_vars, set_unset_national_vars),
    property!(text Advanced Custom "ListingCommand", listing_command, set_listing_command),
    property!(flag Advanced Table "IgnoreLsWarnings", ignore_ls_warnings, set_ignore_ls_warnings),
    property!(flag Advanced Table "SCP1Compatibility", scp1_compatibility, set_scp1_compatibility),
    property!(@row Advanced Custom Identity "TimeDifference" [],
        |d| PropertyValue::Float(d.time_difference()),
        |d, v| if let PropertyValue::Float(v) = v { d.set_time_difference(v) }),
    property!(flag Advanced Custom "TimeDifferenceAuto", time_difference_auto, set_time_difference_auto),
    property!(choice Advanced Table Identity "SCPLsFullTime", AutoSwitch, scp_ls_full_time, set_scp_ls_full_time),
    property!(flag Advanced Table "DeleteToRecycleBin", delete_to_recycle_bin, set_delete_to_recycle_bin),
    property!(flag Advanced Table "OverwrittenToRecycleBin", overwritten_to_recycle_bin, set_overwritten_to_recycle_bin),
    property!(text Advanced Table "RecycleBinPath", recycle_bin_path, set_recycle_bin_path),
    property!(text Advanced Table "PostLoginCommands", post_login_commands, set_post_login_commands),
    property!(text Advanced Table "ReturnVar", return_var, set_return_var),
    property!(choice Advanced Table Identity "LookupUserGroups" => "LookupUserGroups2", AutoSwitch, lookup_user_groups, set_lookup_user_groups),
    property!(choice Advanced Table Identity "EOLType", EolType, eol_type, set_eol_type),
    property!(flag Advanced Table "TrimVMSVersions", trim_vms_versions, set_trim_vms_versions),
    property!(choice Advanced Table Identity "NotUtf" => "Utf" ["SFTPUtfBug"], AutoSwitch, not_utf, set_not_utf),
    property!(choice Advanced Table Identity "PingType", PingType, ping_type, set_ping_type),
    property!(number Advanced Custom "PingInterval", ping_interval, set_ping_interval),
    property!(number Advanced Table "Timeout", timeout, set_timeout),
    property!(flag Advanced Table "TryAgent", try_agent, set_try_agent),
    property!(flag Advanced Table "AgentFwd", agent_fwd, set_agent_fwd),
    property!(flag Advanced Table "AuthTIS", auth_tis, set_auth_tis),
    property!(flag Advanced Table "AuthKI", auth_ki, set_auth_ki),
    property!(flag Advanced Table "AuthKIPassword", auth_ki_password, set_auth_ki_password),
    property!(flag Advanced Table "AuthGSSAPI" ["AuthSSPI"], auth_gssapi, set_auth_gssapi),
    property!(flag Advanced Table "GSSAPIFwdTGT" ["GssapiFwd", "SSPIFwdTGT"], gssapi_fwd_tgt, set_gssapi_fwd_tgt),
    property!(text Advanced Table "GSSAPIServerRealm" ["KerbPrincipal"], gssapi_server_realm, set_gssapi_server_realm),
    property!(flag Advanced Table "ChangeUsername", change_username, set_change_username),
    property!(flag Advanced Table "Compression", compression, set_compression),
    property!(choice Advanced Table Identity "SshProt", SshProt, ssh_prot, set_ssh_prot),
    property!(flag Advanced Table "Ssh2DES", ssh2_des, set_ssh2_des),
    property!(flag Advanced Table "SshNoUserAuth", ssh_no_user_auth, set_ssh_no_user_auth),
    property!(@row Advanced Table Identity "Cipher" [],
        |d| PropertyValue::Str(d.cipher_list()),
        |d, v| if let PropertyValue::Str(v) = v { d.set_cipher_list(&v) }),
    property!(@row Advanced Table Identity "Kex" "KEX" [],
        |d| PropertyValue::Str(d.kex_list()),
        |d, v| if let PropertyValue::Str(v) = v { d.set_kex_list(&v) }),
    property!(text Advanced Table "RekeyData" => "RekeyBytes", rekey_data, set_rekey_data),
    property!(number Advanced Table "RekeyTime", rekey_time, set_rekey_time),
    property!(choice Advanced Table Identity "AddressFamily", AddressFamily, address_family, set_address_family),
    property!(flag Advanced Table "TcpNoDelay", tcp_no_delay, set_tcp_no_delay),
    property!(number Advanced Table "SendBuf" ["SshSendBuf"], send_buf, set_send_buf),
    property!(flag Advanced Table "SshSimple", ssh_simple, set_ssh_simple),
    property!(text Advanced Table "HostKey", host_key, set_host_key),
    property!(choice Advanced Table Identity "ProxyMethod", ProxyMethod, proxy_method, set_proxy_method),
    property!(text Advanced Table "ProxyHost", proxy_host, set_proxy_host),
    property!(number Advanced Table "ProxyPort", proxy_port, set_proxy_port),
    property!(text Advanced Table "ProxyUsername", proxy_username, set_proxy_username),
    property!(@row Advanced Custom Identity "ProxyPassword" [],
        |d| PropertyValue::Str(d.proxy_password()),
        |d, v| if let PropertyValue::Str(v) = v { d.set_proxy_password(&v) }),
    property!(text Advanced Custom "ProxyTelnetCommand", proxy_telnet_command, set_proxy_telnet_command),
    property!(text Advanced Custom "ProxyLocalCommand", proxy_local_command, set_proxy_local_command),
    property!(choice Advanced Table ProxyDns "ProxyDNS", AutoSwitch, proxy_dns, set_proxy_dns),
    property!(flag Advanced Table "ProxyLocalhost", proxy_localhost, set_proxy_localhost),
    property!(bug "BugIgnore1", SshBug::Ignore1),
    property!(bug "BugPlainPW1", SshBug::PlainPw1),
    property!(bug "BugRSA1", SshBug::Rsa1),
    property!(bug "BugHMAC2", SshBug::Hmac2),
    property!(bug "BugDeriveKey2", SshBug::DeriveKey2),
    property!(bug "BugRSAPad2", SshBug::RsaPad2),
    property!(bug "BugPKSessID2", SshBug::PkSessId2),
    property!(bug "BugRekey2", SshBug::Rekey2),
    property!(bug "BugMaxPkt2", SshBug::MaxPkt2),
    property!(bug "BugIgnore2", SshBug::Ignore2),
    property!(bug "BugOldGex2", SshBug::OldGex2),
    property!(bug "BugWinAdj", SshBug::WinAdj),
    property!(text Advanced Table "SftpServer", sftp_server, set_sftp_server),
    property!(number Advanced Table "SFTPDownloadQueue", sftp_download_queue, set_sftp_download_queue),
    property!(number Advanced Table "SFTPUploadQueue", sftp_upload_queue, set_sftp_upload_queue),
    property!(number Advanced Table "SFTPListingQueue", sftp_listing_queue, set_sftp_listing_queue),
    property!(number Advanced Table "SFTPMaxVersion", sftp_max_version, set_sftp_max_version),
    property!(number Advanced Table "SFTPMaxPacketSize", sftp_max_packet_size, set_sftp_max_packet_size),
    property!(sftp_bug "SFTPSymlinkBug", SftpBug::Symlink),
    property!(sftp_bug "SFTPSignedTSBug", SftpBug::SignedTs),
    property!(number Base Table "Color", color, set_color),
    property!(text Advanced Table "PuttyProtocol" => "Protocol", putty_protocol, set_putty_protocol),
    property!(flag Advanced Table "Tunnel", tunnel, set_tunnel),
    property!(number Advanced Table "TunnelPortNumber", tunnel_port_number, set_tunnel_port_number),
    property!(text Advanced Table "TunnelUserName", tunnel_user_name, set_tunnel_user_name),
    property!(text Advanced Table "TunnelHostName", tunnel_host_name, set_tunnel_host_name),
    property!(@row Advanced Custom Identity "TunnelPassword" [],
        |d| PropertyValue::Str(d.tunnel_password()),
        |d, v| if let PropertyValue::Str(v) = v { d.set_tunnel_password(&v) }),
    property!(text Advanced Table "TunnelPublicKeyFile", tunnel_public_key_file, set_tunnel_public_key_file),
    property!(number Advanced Table "TunnelLocalPortNumber", tunnel_local_port_number, set_tunnel_local_port_number),
    property!(text Advanced Table "TunnelPortFwd", tunnel_port_fwd, set_tunnel_port_fwd),
    property!(text Advanced Table "TunnelHostKey", tunnel_host_key, set_tunnel_host_key),
    property!(flag Advanced Table "FtpPasvMode", ftp_pasv_mode, set_ftp_pasv_mode),
    property!(choice Advanced Table Identity "FtpForcePasvIp" => "FtpForcePasvIp2", AutoSwitch, ftp_force_pasv_ip, set_ftp_force_pasv_ip),
    property!(choice Advanced Table Identity "FtpUseMlsd", AutoSwitch, ftp_use_mlsd, set_ftp_use_mlsd),
    property!(text Advanced Table "FtpAccount", ftp_account, set_ftp_account),
    property!(number Advanced Table "FtpPingInterval", ftp_ping_interval, set_ftp_ping_interval),
    property!(choice Advanced Table Identity "FtpPingType", PingType, ftp_ping_type, set_ftp_ping_type),
    property!(choice Advanced Table Identity "FtpTransferActiveImmediately" => "FtpTransferActiveImmediately2", AutoSwitch, ftp_transfer_active_immediately, set_ftp_transfer_active_immediately),
    property!(choice Base Table Identity "Ftps", Ftps, ftps, set_ftps),
    property!(choice Advanced Table Identity "FtpListAll", AutoSwitch, ftp_list_all, set_ftp_list_all),
    property!(choice Advanced Table Identity "FtpHost", AutoSwitch, ftp_host, set_ftp_host),
    property!(flag Advanced Table "SslSessionReuse", ssl_session_reuse, set_ssl_session_reuse),
    property!(text Advanced Table "TlsCertificateFile", tls_certificate_file, set_tls_certificate_file),
    property!(number Advanced Table "FtpProxyLogonType", ftp_proxy_logon_type, set_ftp_proxy_logon_type),
    property!(choice Advanced Table Identity "MinTlsVersion", TlsVersion, min_tls_version, set_min_tls_version),
    property!(choice Advanced Table Identity "MaxTlsVersion", TlsVersion, max_tls_version, set_max_tls_version),
    property!(flag Meta Table "IsWorkspace", is_workspace, set_is_workspace),
    property!(text Meta Table "Link", link, set_link),
    property!(text Advanced Table "CustomParam1", custom_param1, set_custom_param1),
    property!(text Advanced Table "CustomParam2", custom_param2, set_custom_param2),
    property!(text Base Table "Note", note, set_note),
];

/// Looks a property up by name (case-insensitive)
#[must_use]
pub fn find_property(name: &str) -> Option<&'static Property> {
    PROPERTIES
        .iter()
        .find(|property| property.name.eq_ignore_ascii_case(name))
}

impl SessionData {
    /// Names of properties whose values differ from `other`.
    ///
    /// Secrets are compared in plaintext. With `advanced_only` only the
    /// advanced group is considered.
    pub fn different_properties(&self, other: &Self, advanced_only: bool) -> Vec<&'static str> {
        PROPERTIES
            .iter()
            .filter(|property| !advanced_only || property.group == PropertyGroup::Advanced)
            .filter(|property| property.value(self) != property.value(other))
            .map(|property| property.name)
            .collect()
    }

    /// Returns true if every compared property matches `other`
    pub fn is_same(&self, other: &Self, advanced_only: bool) -> bool {
        PROPERTIES
            .iter()
            .filter(|property| !advanced_only || property.group == PropertyGroup::Advanced)
            .all(|property| property.value(self) == property.value(other))
    }

    /// Returns true if any advanced setting differs from `defaults`
    pub fn has_advanced_settings(&self, defaults: &Self) -> bool {
        !self.is_same(defaults, true)
    }
}
