//! Session descriptor
//!
//! A [`SessionData`] holds every setting of one connection profile. Plain
//! settings are exposed through getter/setter pairs; each setter marks the
//! descriptor modified when the value actually changes.
//!
//! Secrets are kept encrypted with the injected [`SecretCodec`] under key
//! material made of other fields (the session password is keyed by user name
//! and host name). Setters of those key fields decrypt the dependent secret
//! first and re-encrypt it afterwards, so a secret never becomes unreadable
//! because its key material changed.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::algorithms::{self, Algorithm, Cipher, Kex};
use crate::error::{SecretError, SecretResult, SessionError, SessionResult};
use crate::secret::{ScrambleCodec, SecretCodec};

use super::protocol::{
    default_port, AddressFamily, AutoSwitch, DstMode, EolType, FsProtocol, Ftps, PingType,
    ProxyMethod, SessionSource, SftpBug, SshBug, SshProt, TlsVersion,
};

/// Name of the descriptor holding default settings
pub const DEFAULT_SESSION_NAME: &str = "Default Settings";
/// Prefix of one-shot hidden sites
pub const HIDDEN_PREFIX: &str = "_!_";
/// User name set for anonymous FTP logins
pub const ANONYMOUS_USER_NAME: &str = "anonymous";
/// Password set for anonymous FTP logins
pub const ANONYMOUS_PASSWORD: &str = "anonymous@example.com";
/// PuTTY protocol name for SSH
pub const PUTTY_SSH_PROTOCOL: &str = "ssh";
/// Name used when nothing better is known
const FALLBACK_SESSION_NAME: &str = "session";

/// One connection profile.
#[derive(Clone)]
pub struct SessionData {
    pub(crate) codec: Arc<dyn SecretCodec>,

    // identity
    pub(crate) name: String,
    pub(crate) is_workspace: bool,
    pub(crate) link: String,
    pub(crate) selected: bool,
    pub(crate) special: bool,
    pub(crate) save_only: bool,
    pub(crate) override_cached_host_key: bool,
    pub(crate) modified: bool,
    pub(crate) source: SessionSource,

    // connection
    pub(crate) host_name: String,
    pub(crate) port_number: u16,
    pub(crate) user_name: String,
    pub(crate) password: Vec<u8>,
    pub(crate) public_key_file: String,
    pub(crate) passphrase: Vec<u8>,
    pub(crate) fs_protocol: FsProtocol,
    pub(crate) ftps: Ftps,
    pub(crate) address_family: AddressFamily,
    pub(crate) putty_protocol: String,
    pub(crate) host_key: String,
    pub(crate) note: String,

    // ssh
    pub(crate) ping_type: PingType,
    pub(crate) ping_interval: u32,
    pub(crate) timeout: u32,
    pub(crate) try_agent: bool,
    pub(crate) agent_fwd: bool,
    pub(crate) auth_tis: bool,
    pub(crate) auth_ki: bool,
    pub(crate) auth_ki_password: bool,
    pub(crate) auth_gssapi: bool,
    pub(crate) gssapi_fwd_tgt: bool,
    pub(crate) gssapi_server_realm: String,
    pub(crate) change_username: bool,
    pub(crate) compression: bool,
    pub(crate) ssh_prot: SshProt,
    pub(crate) ssh2_des: bool,
    pub(crate) ssh_no_user_auth: bool,
    pub(crate) ciphers: Vec<Cipher>,
    pub(crate) kex: Vec<Kex>,
    pub(crate) rekey_data: String,
    pub(crate) rekey_time: u32,
    pub(crate) tcp_no_delay: bool,
    pub(crate) send_buf: i32,
    pub(crate) ssh_simple: bool,
    pub(crate) bugs: [AutoSwitch; SshBug::COUNT],

    // proxy
    pub(crate) proxy_method: ProxyMethod,
    pub(crate) proxy_host: String,
    pub(crate) proxy_port: u16,
    pub(crate) proxy_username: String,
    pub(crate) proxy_password: Vec<u8>,
    pub(crate) proxy_telnet_command: String,
    pub(crate) proxy_local_command: String,
    pub(crate) proxy_dns: AutoSwitch,
    pub(crate) proxy_localhost: bool,

    // directories and state
    pub(crate) local_directory: String,
    pub(crate) remote_directory: String,
    pub(crate) synchronize_browsing: bool,
    pub(crate) update_directories: bool,
    pub(crate) cache_directories: bool,
    pub(crate) cache_directory_changes: bool,
    pub(crate) preserve_directory_changes: bool,
    pub(crate) lock_in_home: bool,
    pub(crate) resolve_symlinks: bool,
    pub(crate) dst_mode: DstMode,
    pub(crate) delete_to_recycle_bin: bool,
    pub(crate) overwritten_to_recycle_bin: bool,
    pub(crate) recycle_bin_path: String,
    pub(crate) color: i32,
    pub(crate) post_login_commands: String,

    // scp and shell
    pub(crate) shell: String,
    pub(crate) return_var: String,
    pub(crate) lookup_user_groups: AutoSwitch,
    pub(crate) eol_type: EolType,
    pub(crate) trim_vms_versions: bool,
    pub(crate) clear_aliases: bool,
    pub(crate) unset_national_vars: bool,
    pub(crate) listing_command: String,
    pub(crate) ignore_ls_warnings: bool,
    pub(crate) scp1_compatibility: bool,
    /// Fraction of a day
    pub(crate) time_difference: f64,
    pub(crate) time_difference_auto: bool,
    pub(crate) scp_ls_full_time: AutoSwitch,
    pub(crate) not_utf: AutoSwitch,

    // sftp
    pub(crate) sftp_server: String,
    pub(crate) sftp_download_queue: i32,
    pub(crate) sftp_upload_queue: i32,
    pub(crate) sftp_listing_queue: i32,
    pub(crate) sftp_max_version: i32,
    pub(crate) sftp_max_packet_size: u32,
    pub(crate) sftp_bugs: [AutoSwitch; SftpBug::COUNT],

    // tunnel
    pub(crate) tunnel: bool,
    pub(crate) tunnel_host_name: String,
    pub(crate) tunnel_port_number: u16,
    pub(crate) tunnel_user_name: String,
    pub(crate) tunnel_password: Vec<u8>,
    pub(crate) tunnel_public_key_file: String,
    pub(crate) tunnel_local_port_number: u16,
    pub(crate) tunnel_port_fwd: String,
    pub(crate) tunnel_host_key: String,
    orig_host_name: String,
    orig_port_number: u16,
    orig_proxy_method: ProxyMethod,

    // ftp and tls
    pub(crate) ftp_pasv_mode: bool,
    pub(crate) ftp_force_pasv_ip: AutoSwitch,
    pub(crate) ftp_use_mlsd: AutoSwitch,
    pub(crate) ftp_account: String,
    pub(crate) ftp_ping_interval: u32,
    pub(crate) ftp_ping_type: PingType,
    pub(crate) ftp_transfer_active_immediately: AutoSwitch,
    pub(crate) ftp_list_all: AutoSwitch,
    pub(crate) ftp_host: AutoSwitch,
    pub(crate) ssl_session_reuse: bool,
    pub(crate) tls_certificate_file: String,
    pub(crate) ftp_proxy_logon_type: i32,
    pub(crate) min_tls_version: TlsVersion,
    pub(crate) max_tls_version: TlsVersion,

    pub(crate) custom_param1: String,
    pub(crate) custom_param2: String,
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("name", &self.name)
            .field("host_name", &self.host_name)
            .field("port_number", &self.port_number)
            .field("user_name", &self.user_name)
            .field("fs_protocol", &self.fs_protocol)
            .field("ftps", &self.ftps)
            .field("is_workspace", &self.is_workspace)
            .field("link", &self.link)
            .field("modified", &self.modified)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new("")
    }
}

impl SessionData {
    /// Creates a descriptor with factory defaults and the scramble codec
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_codec(name, Arc::new(ScrambleCodec::new()))
    }

    /// Creates a descriptor with factory defaults and the given codec
    #[must_use]
    pub fn with_codec(name: impl Into<String>, codec: Arc<dyn SecretCodec>) -> Self {
        Self {
            codec,
            name: name.into(),
            is_workspace: false,
            link: String::new(),
            selected: false,
            special: false,
            save_only: false,
            override_cached_host_key: true,
            modified: true,
            source: SessionSource::AdHoc,

            host_name: String::new(),
            port_number: super::protocol::SSH_PORT,
            user_name: String::new(),
            password: Vec::new(),
            public_key_file: String::new(),
            passphrase: Vec::new(),
            fs_protocol: FsProtocol::Sftp,
            ftps: Ftps::None,
            address_family: AddressFamily::Auto,
            putty_protocol: String::new(),
            host_key: String::new(),
            note: String::new(),

            ping_type: PingType::Off,
            ping_interval: 30,
            timeout: 15,
            try_agent: true,
            agent_fwd: false,
            auth_tis: false,
            auth_ki: true,
            auth_ki_password: true,
            auth_gssapi: false,
            gssapi_fwd_tgt: false,
            gssapi_server_realm: String::new(),
            change_username: false,
            compression: false,
            ssh_prot: SshProt::Ssh2Only,
            ssh2_des: false,
            ssh_no_user_auth: false,
            ciphers: Cipher::DEFAULT_ORDER.to_vec(),
            kex: Kex::DEFAULT_ORDER.to_vec(),
            rekey_data: "1G".to_string(),
            rekey_time: 60,
            tcp_no_delay: true,
            send_buf: 256 * 1024,
            ssh_simple: true,
            bugs: [AutoSwitch::Auto; SshBug::COUNT],

            proxy_method: ProxyMethod::None,
            proxy_host: "proxy".to_string(),
            proxy_port: 80,
            proxy_username: String::new(),
            proxy_password: Vec::new(),
            proxy_telnet_command: "connect %host %port\\n".to_string(),
            proxy_local_command: String::new(),
            proxy_dns: AutoSwitch::Auto,
            proxy_localhost: false,

            local_directory: String::new(),
            remote_directory: String::new(),
            synchronize_browsing: false,
            update_directories: true,
            cache_directories: true,
            cache_directory_changes: true,
            preserve_directory_changes: true,
            lock_in_home: false,
            resolve_symlinks: true,
            dst_mode: DstMode::Unix,
            delete_to_recycle_bin: false,
            overwritten_to_recycle_bin: false,
            recycle_bin_path: String::new(),
            color: 0,
            post_login_commands: String::new(),

            shell: String::new(),
            return_var: String::new(),
            lookup_user_groups: AutoSwitch::Auto,
            eol_type: EolType::Lf,
            trim_vms_versions: false,
            clear_aliases: true,
            unset_national_vars: true,
            listing_command: "ls -la".to_string(),
            ignore_ls_warnings: true,
            scp1_compatibility: false,
            time_difference: 0.0,
            time_difference_auto: true,
            scp_ls_full_time: AutoSwitch::Auto,
            not_utf: AutoSwitch::Auto,

            sftp_server: String::new(),
            sftp_download_queue: 32,
            sftp_upload_queue: 32,
            sftp_listing_queue: 2,
            sftp_max_version: 6,
            sftp_max_packet_size: 0,
            sftp_bugs: [AutoSwitch::Auto; SftpBug::COUNT],

            tunnel: false,
            tunnel_host_name: String::new(),
            tunnel_port_number: super::protocol::SSH_PORT,
            tunnel_user_name: String::new(),
            tunnel_password: Vec::new(),
            tunnel_public_key_file: String::new(),
            tunnel_local_port_number: 0,
            tunnel_port_fwd: String::new(),
            tunnel_host_key: String::new(),
            orig_host_name: String::new(),
            orig_port_number: 0,
            orig_proxy_method: ProxyMethod::None,

            ftp_pasv_mode: true,
            ftp_force_pasv_ip: AutoSwitch::Auto,
            ftp_use_mlsd: AutoSwitch::Auto,
            ftp_account: String::new(),
            ftp_ping_interval: 30,
            ftp_ping_type: PingType::DummyCommand,
            ftp_transfer_active_immediately: AutoSwitch::Auto,
            ftp_list_all: AutoSwitch::Auto,
            ftp_host: AutoSwitch::Auto,
            ssl_session_reuse: true,
            tls_certificate_file: String::new(),
            ftp_proxy_logon_type: 0,
            min_tls_version: TlsVersion::Tls10,
            max_tls_version: TlsVersion::Tls12,

            custom_param1: String::new(),
            custom_param2: String::new(),
        }
    }

    /// The codec protecting this descriptor's secrets
    #[must_use]
    pub fn codec(&self) -> &Arc<dyn SecretCodec> {
        &self.codec
    }

    // ========== Change tracking ==========

    /// Marks the descriptor changed
    pub fn modify(&mut self) {
        self.modified = true;
        if self.source == SessionSource::Stored {
            self.source = SessionSource::StoredModified;
        }
    }

    /// Returns true if changed since last load or save
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Overrides the modified flag
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Where this descriptor came from
    pub fn source(&self) -> SessionSource {
        self.source
    }

    pub(crate) fn set_source(&mut self, source: SessionSource) {
        self.source = source;
    }

    /// Label for [`SessionData::source`]
    pub fn source_description(&self) -> &'static str {
        self.source.description()
    }

    /// Copies every setting of `other`, including its source
    pub fn assign(&mut self, other: &Self) {
        *self = other.clone();
    }

    /// Copies every setting of `other`, keeping this descriptor's source
    pub fn copy_data(&mut self, other: &Self) {
        let source = self.source;
        *self = other.clone();
        self.source = source;
    }

    /// Returns true if directories or color were customized
    pub fn has_state_data(&self) -> bool {
        !self.remote_directory.is_empty() || !self.local_directory.is_empty() || self.color != 0
    }

    /// Copies directory and color state from `other`
    pub fn copy_state_data(&mut self, other: &Self) {
        self.set_remote_directory(other.remote_directory.clone());
        self.set_local_directory(other.local_directory.clone());
        self.set_synchronize_browsing(other.synchronize_browsing);
        self.set_color(other.color);
    }

    // ========== Secrets ==========

    fn decrypt_secret(&self, cipher: &[u8], key_material: &str) -> String {
        match self.try_decrypt_secret(cipher, key_material) {
            Ok(plain) => plain,
            Err(e) => {
                tracing::warn!(site = %self.session_name(), error = %e, "Cannot decrypt stored secret");
                String::new()
            }
        }
    }

    fn try_decrypt_secret(&self, cipher: &[u8], key_material: &str) -> SecretResult<String> {
        match self.codec.decrypt(cipher, key_material) {
            Err(SecretError::PromptAborted) => Ok(String::new()),
            other => other,
        }
    }

    pub(crate) fn password_key(&self) -> String {
        format!("{}{}", self.user_name, self.host_name)
    }

    pub(crate) fn proxy_password_key(&self) -> String {
        format!("{}{}", self.proxy_username, self.proxy_host)
    }

    pub(crate) fn tunnel_password_key(&self) -> String {
        format!("{}{}", self.tunnel_user_name, self.tunnel_host_name)
    }

    /// Session password, empty if unknown
    pub fn password(&self) -> String {
        self.decrypt_secret(&self.password, &self.password_key())
    }

    /// Session password.
    ///
    /// An aborted master password prompt yields an empty password.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored secret cannot be decrypted.
    pub fn try_password(&self) -> SecretResult<String> {
        self.try_decrypt_secret(&self.password, &self.password_key())
    }

    /// Sets the session password
    pub fn set_password(&mut self, value: &str) {
        let key = self.password_key();
        if replace_secret(self.codec.as_ref(), &mut self.password, value, &key) {
            self.modify();
        }
    }

    /// Returns true if a session password is set
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Private key passphrase, empty if unknown
    pub fn passphrase(&self) -> String {
        self.decrypt_secret(&self.passphrase, &self.public_key_file)
    }

    /// Sets the private key passphrase
    pub fn set_passphrase(&mut self, value: &str) {
        if replace_secret(self.codec.as_ref(), &mut self.passphrase, value, &self.public_key_file) {
            self.modify();
        }
    }

    /// Proxy password, empty if unknown
    pub fn proxy_password(&self) -> String {
        self.decrypt_secret(&self.proxy_password, &self.proxy_password_key())
    }

    /// Sets the proxy password
    pub fn set_proxy_password(&mut self, value: &str) {
        let key = self.proxy_password_key();
        if replace_secret(self.codec.as_ref(), &mut self.proxy_password, value, &key) {
            self.modify();
        }
    }

    /// Tunnel password, empty if unknown
    pub fn tunnel_password(&self) -> String {
        self.decrypt_secret(&self.tunnel_password, &self.tunnel_password_key())
    }

    /// Sets the tunnel password
    pub fn set_tunnel_password(&mut self, value: &str) {
        let key = self.tunnel_password_key();
        if replace_secret(self.codec.as_ref(), &mut self.tunnel_password, value, &key) {
            self.modify();
        }
    }

    /// Returns true if any password is set
    pub fn has_any_password(&self) -> bool {
        !self.password.is_empty()
            || !self.proxy_password.is_empty()
            || !self.tunnel_password.is_empty()
    }

    /// Forgets the session and tunnel passwords without marking a change
    pub fn clear_session_passwords(&mut self) {
        self.password.clear();
        self.tunnel_password.clear();
    }

    /// Re-wraps every secret in the codec's strongest form.
    ///
    /// # Errors
    ///
    /// Returns the first decryption or prompt failure.
    pub fn recrypt_passwords(&mut self) -> SecretResult<()> {
        self.password = self
            .codec
            .strongly_recrypt(&self.password, &self.password_key())?;
        self.passphrase = self
            .codec
            .strongly_recrypt(&self.passphrase, &self.public_key_file)?;
        self.proxy_password = self
            .codec
            .strongly_recrypt(&self.proxy_password, &self.proxy_password_key())?;
        self.tunnel_password = self
            .codec
            .strongly_recrypt(&self.tunnel_password, &self.tunnel_password_key())?;
        Ok(())
    }

    // ========== Key fields of secrets ==========

    /// Host name
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Sets the host name.
    ///
    /// A leading `scheme://` is dropped and a `user@host` value also sets
    /// the user name. The password is re-keyed.
    pub fn set_host_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        let mut value = crate::url::remove_protocol_prefix(&value).to_string();
        if self.host_name == value {
            return;
        }
        let password = self.password();
        if let Some(at) = value.rfind('@').filter(|&at| at > 0) {
            let user = value[..at].to_string();
            value = value[at + 1..].to_string();
            self.set_user_name(user);
        }
        self.host_name = value;
        self.modify();
        self.set_password(&password);
    }

    /// User name
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Sets the user name, re-keying the password
    pub fn set_user_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.user_name == value {
            return;
        }
        let password = self.password();
        self.user_name = value;
        self.modify();
        self.set_password(&password);
    }

    /// Private key file
    pub fn public_key_file(&self) -> &str {
        &self.public_key_file
    }

    /// Sets the private key file, re-keying the passphrase
    pub fn set_public_key_file(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.public_key_file == value {
            return;
        }
        let passphrase = self.passphrase();
        self.public_key_file = value;
        self.modify();
        self.set_passphrase(&passphrase);
    }

    /// Proxy host
    pub fn proxy_host(&self) -> &str {
        &self.proxy_host
    }

    /// Sets the proxy host, re-keying the proxy password
    pub fn set_proxy_host(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.proxy_host == value {
            return;
        }
        let password = self.proxy_password();
        self.proxy_host = value;
        self.modify();
        self.set_proxy_password(&password);
    }

    /// Proxy user name
    pub fn proxy_username(&self) -> &str {
        &self.proxy_username
    }

    /// Sets the proxy user name, re-keying the proxy password
    pub fn set_proxy_username(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.proxy_username == value {
            return;
        }
        let password = self.proxy_password();
        self.proxy_username = value;
        self.modify();
        self.set_proxy_password(&password);
    }

    /// Tunnel host name
    pub fn tunnel_host_name(&self) -> &str {
        &self.tunnel_host_name
    }

    /// Sets the tunnel host name.
    ///
    /// A `user@host` value also sets the tunnel user name. The tunnel
    /// password is re-keyed.
    pub fn set_tunnel_host_name(&mut self, value: impl Into<String>) {
        let mut value = value.into();
        if self.tunnel_host_name == value {
            return;
        }
        let password = self.tunnel_password();
        if let Some(at) = value.rfind('@') {
            let user = value[..at].to_string();
            value = value[at + 1..].to_string();
            self.set_tunnel_user_name(user);
        }
        self.tunnel_host_name = value;
        self.modify();
        self.set_tunnel_password(&password);
    }

    /// Tunnel user name
    pub fn tunnel_user_name(&self) -> &str {
        &self.tunnel_user_name
    }

    /// Sets the tunnel user name, re-keying the tunnel password
    pub fn set_tunnel_user_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.tunnel_user_name == value {
            return;
        }
        let password = self.tunnel_password();
        self.tunnel_user_name = value;
        self.modify();
        self.set_tunnel_password(&password);
    }

    // ========== Environment expansion ==========

    /// Host name with environment variables expanded
    pub fn host_name_expanded(&self) -> String {
        expand_env(&self.host_name)
    }

    /// User name with environment variables expanded
    pub fn user_name_expanded(&self) -> String {
        expand_env(&self.user_name)
    }

    /// Private key path with `~` and environment variables expanded
    pub fn public_key_file_expanded(&self) -> String {
        expand_path(&self.public_key_file)
    }

    /// Tunnel private key path with `~` and environment variables expanded
    pub fn tunnel_public_key_file_expanded(&self) -> String {
        expand_path(&self.tunnel_public_key_file)
    }

    /// Client certificate path with `~` and environment variables expanded
    pub fn tls_certificate_file_expanded(&self) -> String {
        expand_path(&self.tls_certificate_file)
    }

    // ========== Algorithm lists ==========

    /// Cipher preference order
    pub fn ciphers(&self) -> &[Cipher] {
        &self.ciphers
    }

    /// Cipher preference in storage form
    pub fn cipher_list(&self) -> String {
        algorithms::format_list(&self.ciphers)
    }

    /// Sets the cipher preference from its storage form
    pub fn set_cipher_list(&mut self, value: &str) {
        self.set_ciphers(&algorithms::parse_list(value));
    }

    /// Sets the cipher preference, completing it with the defaults
    pub fn set_ciphers(&mut self, value: &[Cipher]) {
        let merged = algorithms::merge(value, Cipher::DEFAULT_ORDER);
        if merged != self.ciphers {
            self.ciphers = merged;
            self.modify();
        }
    }

    /// Key exchange preference order
    pub fn kex(&self) -> &[Kex] {
        &self.kex
    }

    /// Key exchange preference in storage form
    pub fn kex_list(&self) -> String {
        algorithms::format_list(&self.kex)
    }

    /// Sets the key exchange preference from its storage form
    pub fn set_kex_list(&mut self, value: &str) {
        self.set_kex(&algorithms::parse_list(value));
    }

    /// Sets the key exchange preference, completing it with the defaults
    pub fn set_kex(&mut self, value: &[Kex]) {
        let merged = algorithms::merge(value, Kex::DEFAULT_ORDER);
        if merged != self.kex {
            self.kex = merged;
            self.modify();
        }
    }

    // ========== Bug switches ==========

    /// SSH bug workaround setting
    pub fn bug(&self, bug: SshBug) -> AutoSwitch {
        self.bugs[bug.slot()]
    }

    /// Sets an SSH bug workaround
    pub fn set_bug(&mut self, bug: SshBug, value: AutoSwitch) {
        if self.bugs[bug.slot()] != value {
            self.bugs[bug.slot()] = value;
            self.modify();
        }
    }

    /// SFTP bug workaround setting
    pub fn sftp_bug(&self, bug: SftpBug) -> AutoSwitch {
        self.sftp_bugs[bug.slot()]
    }

    /// Sets an SFTP bug workaround
    pub fn set_sftp_bug(&mut self, bug: SftpBug, value: AutoSwitch) {
        if self.sftp_bugs[bug.slot()] != value {
            self.sftp_bugs[bug.slot()] = value;
            self.modify();
        }
    }

    // ========== Derived queries ==========

    /// Returns true if the connection is encrypted
    pub fn is_secure(&self) -> bool {
        self.fs_protocol.is_ssh() || self.ftps != Ftps::None
    }

    /// Well-known port of the current protocol and TLS mode
    pub fn default_port(&self) -> u16 {
        default_port(self.fs_protocol, self.ftps)
    }

    /// Returns true if the descriptor carries enough to connect
    pub fn can_login(&self) -> bool {
        !self.host_name.is_empty()
    }

    /// Returns true if both describe the same server account
    pub fn is_same_site(&self, other: &Self) -> bool {
        self.fs_protocol == other.fs_protocol
            && self.host_name == other.host_name
            && self.port_number == other.port_number
            && self.user_name == other.user_name
    }

    /// PuTTY protocol, `ssh` when unset
    pub fn normalized_putty_protocol(&self) -> String {
        if self.putty_protocol.is_empty() {
            PUTTY_SSH_PROTOCOL.to_string()
        } else {
            self.putty_protocol.to_ascii_lowercase()
        }
    }

    /// Human readable protocol name
    pub fn fs_protocol_str(&self) -> &'static str {
        self.fs_protocol.display_name()
    }

    // ========== Tunnel ==========

    /// Redirects the descriptor to a local tunnel endpoint
    pub fn configure_tunnel(&mut self, local_port: u16) {
        self.orig_host_name = self.host_name.clone();
        self.orig_port_number = self.port_number;
        self.orig_proxy_method = self.proxy_method;

        self.set_host_name("127.0.0.1");
        self.set_port_number(local_port);
        // the tunnel itself uses the proxy settings
        self.set_proxy_method(ProxyMethod::None);
    }

    /// Undoes [`SessionData::configure_tunnel`]
    pub fn rollback_tunnel(&mut self) {
        let host = std::mem::take(&mut self.orig_host_name);
        self.set_host_name(host);
        self.set_port_number(self.orig_port_number);
        self.set_proxy_method(self.orig_proxy_method);
    }

    // ========== Naming ==========

    /// Stored name, possibly `/` separated
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the descriptor
    pub fn set_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.name != value {
            self.name = value;
            self.modify();
        }
    }

    /// Returns true for one-shot sites created by external launchers
    pub fn hidden(&self) -> bool {
        self.name.starts_with(HIDDEN_PREFIX)
    }

    /// Name with the hidden prefix removed
    pub fn name_without_hidden_prefix(&self) -> &str {
        self.name.strip_prefix(HIDDEN_PREFIX).unwrap_or(&self.name)
    }

    /// Returns true if the descriptor has a user-given site name
    pub fn has_session_name(&self) -> bool {
        let name = self.name_without_hidden_prefix();
        !name.is_empty() && name != DEFAULT_SESSION_NAME && !self.is_workspace
    }

    /// Name synthesized from connection details
    pub fn default_session_name(&self) -> String {
        match (self.host_name.is_empty(), self.user_name.is_empty()) {
            (false, false) => format!("{}@{}", self.user_name, self.host_name),
            (false, true) => self.host_name.clone(),
            (true, _) => FALLBACK_SESSION_NAME.to_string(),
        }
    }

    /// Display name: the site name, or a synthesized one
    pub fn session_name(&self) -> String {
        if self.has_session_name() {
            self.name_without_hidden_prefix().to_string()
        } else {
            self.default_session_name()
        }
    }

    /// Last segment of the name
    pub fn local_name(&self) -> String {
        if self.has_session_name() {
            Self::extract_local_name(self.name_without_hidden_prefix()).to_string()
        } else {
            self.default_session_name()
        }
    }

    /// Folder (or workspace) part of the name
    pub fn folder_name(&self) -> String {
        if self.has_session_name() || self.is_workspace {
            Self::extract_folder_name(&self.name).to_string()
        } else {
            String::new()
        }
    }

    /// `user@host`
    pub fn session_key(&self) -> String {
        format!("{}@{}", self.user_name, self.host_name)
    }

    /// `host:port`
    pub fn site_key(&self) -> String {
        format!("{}:{}", self.host_name, self.port_number)
    }

    /// Key used when the descriptor is stored
    pub fn storage_key(&self) -> String {
        self.session_name()
    }

    /// Subkey the descriptor is loaded from and saved to
    pub fn internal_storage_key(&self) -> String {
        if self.name.is_empty() {
            self.session_key()
        } else {
            self.name.clone()
        }
    }

    /// Returns true if the name lies below `folder`
    pub fn is_in_folder_or_workspace(&self, folder: &str) -> bool {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        self.name.len() >= prefix.len()
            && self.name.is_char_boundary(prefix.len())
            && self.name[..prefix.len()].eq_ignore_ascii_case(&prefix)
    }

    /// Joins a folder path and a name
    #[must_use]
    pub fn compose_path(path: &str, name: &str) -> String {
        if path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", path.trim_end_matches('/'), name)
        }
    }

    /// Last `/` separated segment of `name`
    #[must_use]
    pub fn extract_local_name(name: &str) -> &str {
        name.rsplit_once('/').map_or(name, |(_, local)| local)
    }

    /// Everything before the last `/` of `name`
    #[must_use]
    pub fn extract_folder_name(name: &str) -> &str {
        name.rsplit_once('/').map_or("", |(folder, _)| folder)
    }

    /// Rejects names a user may not give a site.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidName` if `name` contains `/`.
    pub fn validate_name(name: &str) -> SessionResult<()> {
        if name.contains('/') {
            return Err(SessionError::InvalidName {
                name: name.to_string(),
                reason: "site name cannot contain '/'".to_string(),
            });
        }
        Ok(())
    }

    /// Makes `name` acceptable to [`SessionData::validate_name`]
    #[must_use]
    pub fn make_valid_name(name: &str) -> String {
        name.replace('/', "\\")
    }

    /// Renames until `taken` no longer reports a clash.
    ///
    /// `site` becomes `site (1)`, then `site (2)` and so on.
    pub fn make_unique_in(&mut self, taken: impl Fn(&str) -> bool) {
        while taken(&self.name) {
            let mut counter = 0_u32;
            let mut base = self.name.clone();
            if base.ends_with(')') {
                if let Some(open) = base.rfind('(') {
                    if let Ok(n) = base[open + 1..base.len() - 1].parse::<u32>() {
                        counter = n;
                        base.truncate(open);
                        base = base.trim_end().to_string();
                    }
                }
            }
            self.name = format!("{} ({})", base, counter + 1);
        }
    }

    /// Sort order of stored sites.
    ///
    /// Workspace entries carry hex-like names, so two workspaces compare
    /// ordinally; everything else uses natural ordering.
    pub fn compare(&self, other: &Self) -> Ordering {
        if self.is_workspace && other.is_workspace {
            self.name.cmp(&other.name)
        } else {
            natural_cmp(&self.name, &other.name)
        }
    }
}

macro_rules! value_properties {
    ($( $(#[$doc:meta])* $field:ident, $setter:ident: $ty:ty; )*) => {
        impl SessionData {
            $(
                $(#[$doc])*
                pub fn $field(&self) -> $ty {
                    self.$field
                }

                #[doc = concat!("Sets `", stringify!($field), "`")]
                pub fn $setter(&mut self, value: $ty) {
                    #[allow(clippy::float_cmp)]
                    if self.$field != value {
                        self.$field = value;
                        self.modify();
                    }
                }
            )*
        }
    };
}

macro_rules! text_properties {
    ($( $(#[$doc:meta])* $field:ident, $setter:ident; )*) => {
        impl SessionData {
            $(
                $(#[$doc])*
                pub fn $field(&self) -> &str {
                    &self.$field
                }

                #[doc = concat!("Sets `", stringify!($field), "`")]
                pub fn $setter(&mut self, value: impl Into<String>) {
                    let value = value.into();
                    if self.$field != value {
                        self.$field = value;
                        self.modify();
                    }
                }
            )*
        }
    };
}

value_properties! {
    /// Workspace entry
    is_workspace, set_is_workspace: bool;
    /// Internal flag, never persisted
    special, set_special: bool;
    /// Only save the site, do not connect
    save_only, set_save_only: bool;
    /// Whether a given host key replaces the cached one
    override_cached_host_key, set_override_cached_host_key: bool;
    /// Port number
    port_number, set_port_number: u16;
    /// File transfer protocol
    fs_protocol, set_fs_protocol: FsProtocol;
    /// TLS mode
    ftps, set_ftps: Ftps;
    /// IP version preference
    address_family, set_address_family: AddressFamily;
    /// Keepalive kind
    ping_type, set_ping_type: PingType;
    /// Keepalive interval in seconds
    ping_interval, set_ping_interval: u32;
    /// Connection timeout in seconds
    timeout, set_timeout: u32;
    /// Try Pageant/agent authentication
    try_agent, set_try_agent: bool;
    /// Forward the agent
    agent_fwd, set_agent_fwd: bool;
    /// TIS/CryptoCard authentication
    auth_tis, set_auth_tis: bool;
    /// Keyboard-interactive authentication
    auth_ki, set_auth_ki: bool;
    /// Answer keyboard-interactive prompts with the password
    auth_ki_password, set_auth_ki_password: bool;
    /// GSSAPI authentication
    auth_gssapi, set_auth_gssapi: bool;
    /// GSSAPI credential delegation
    gssapi_fwd_tgt, set_gssapi_fwd_tgt: bool;
    /// Allow user name changes in SSH-2
    change_username, set_change_username: bool;
    /// SSH compression
    compression, set_compression: bool;
    /// SSH protocol versions
    ssh_prot, set_ssh_prot: SshProt;
    /// Single-DES in SSH-2
    ssh2_des, set_ssh2_des: bool;
    /// Skip SSH user authentication
    ssh_no_user_auth, set_ssh_no_user_auth: bool;
    /// Minutes before re-keying
    rekey_time, set_rekey_time: u32;
    /// TCP_NODELAY
    tcp_no_delay, set_tcp_no_delay: bool;
    /// Socket send buffer size
    send_buf, set_send_buf: i32;
    /// Simple SSH channel handling
    ssh_simple, set_ssh_simple: bool;
    /// Proxy kind
    proxy_method, set_proxy_method: ProxyMethod;
    /// Proxy port
    proxy_port, set_proxy_port: u16;
    /// DNS resolution at the proxy
    proxy_dns, set_proxy_dns: AutoSwitch;
    /// Use the proxy for local addresses
    proxy_localhost, set_proxy_localhost: bool;
    /// Keep local and remote panels in sync
    synchronize_browsing, set_synchronize_browsing: bool;
    /// Refresh directories after changes
    update_directories, set_update_directories: bool;
    /// Cache directory listings
    cache_directories, set_cache_directories: bool;
    /// Cache directory changes
    cache_directory_changes, set_cache_directory_changes: bool;
    /// Keep directory change cache between sessions
    preserve_directory_changes, set_preserve_directory_changes: bool;
    /// Do not allow leaving the home directory
    lock_in_home, set_lock_in_home: bool;
    /// Follow symbolic links
    resolve_symlinks, set_resolve_symlinks: bool;
    /// Daylight saving handling
    dst_mode, set_dst_mode: DstMode;
    /// Move deleted files to the recycle bin
    delete_to_recycle_bin, set_delete_to_recycle_bin: bool;
    /// Move overwritten files to the recycle bin
    overwritten_to_recycle_bin, set_overwritten_to_recycle_bin: bool;
    /// Color tag, 0 for none
    color, set_color: i32;
    /// Resolve user and group names
    lookup_user_groups, set_lookup_user_groups: AutoSwitch;
    /// Remote line endings
    eol_type, set_eol_type: EolType;
    /// Strip VMS version numbers
    trim_vms_versions, set_trim_vms_versions: bool;
    /// Clear shell aliases
    clear_aliases, set_clear_aliases: bool;
    /// Unset locale variables
    unset_national_vars, set_unset_national_vars: bool;
    /// Ignore ls warnings
    ignore_ls_warnings, set_ignore_ls_warnings: bool;
    /// SCP1 compatibility
    scp1_compatibility, set_scp1_compatibility: bool;
    /// Server time offset in fractions of a day
    time_difference, set_time_difference: f64;
    /// Detect the time offset automatically
    time_difference_auto, set_time_difference_auto: bool;
    /// `ls --full-time`
    scp_ls_full_time, set_scp_ls_full_time: AutoSwitch;
    /// Non-UTF-8 file names
    not_utf, set_not_utf: AutoSwitch;
    /// SFTP download pipeline depth
    sftp_download_queue, set_sftp_download_queue: i32;
    /// SFTP upload pipeline depth
    sftp_upload_queue, set_sftp_upload_queue: i32;
    /// SFTP listing pipeline depth
    sftp_listing_queue, set_sftp_listing_queue: i32;
    /// Highest SFTP version to negotiate
    sftp_max_version, set_sftp_max_version: i32;
    /// SFTP packet size limit, 0 for automatic
    sftp_max_packet_size, set_sftp_max_packet_size: u32;
    /// Connect through an SSH tunnel
    tunnel, set_tunnel: bool;
    /// Tunnel host port
    tunnel_port_number, set_tunnel_port_number: u16;
    /// Local tunnel port, 0 for automatic
    tunnel_local_port_number, set_tunnel_local_port_number: u16;
    /// FTP passive mode
    ftp_pasv_mode, set_ftp_pasv_mode: bool;
    /// Ignore the address in PASV responses
    ftp_force_pasv_ip, set_ftp_force_pasv_ip: AutoSwitch;
    /// Use MLSD listings
    ftp_use_mlsd, set_ftp_use_mlsd: AutoSwitch;
    /// FTP keepalive interval in seconds
    ftp_ping_interval, set_ftp_ping_interval: u32;
    /// FTP keepalive kind
    ftp_ping_type, set_ftp_ping_type: PingType;
    /// Start active transfers immediately
    ftp_transfer_active_immediately, set_ftp_transfer_active_immediately: AutoSwitch;
    /// `LIST -a`
    ftp_list_all, set_ftp_list_all: AutoSwitch;
    /// Send the HOST command
    ftp_host, set_ftp_host: AutoSwitch;
    /// Reuse TLS sessions for data connections
    ssl_session_reuse, set_ssl_session_reuse: bool;
    /// FTP proxy logon style
    ftp_proxy_logon_type, set_ftp_proxy_logon_type: i32;
    /// Lowest TLS version
    min_tls_version, set_min_tls_version: TlsVersion;
    /// Highest TLS version
    max_tls_version, set_max_tls_version: TlsVersion;
}

text_properties! {
    /// Site this workspace entry refers to
    link, set_link;
    /// PuTTY protocol name
    putty_protocol, set_putty_protocol;
    /// Expected host key fingerprint
    host_key, set_host_key;
    /// Free text note
    note, set_note;
    /// GSSAPI server realm
    gssapi_server_realm, set_gssapi_server_realm;
    /// Bytes before re-keying, e.g. `1G`
    rekey_data, set_rekey_data;
    /// Telnet proxy command
    proxy_telnet_command, set_proxy_telnet_command;
    /// Local proxy command
    proxy_local_command, set_proxy_local_command;
    /// Initial local directory
    local_directory, set_local_directory;
    /// Initial remote directory
    remote_directory, set_remote_directory;
    /// Remote recycle bin
    recycle_bin_path, set_recycle_bin_path;
    /// Commands run after login
    post_login_commands, set_post_login_commands;
    /// Remote shell
    shell, set_shell;
    /// Variable holding the exit code
    return_var, set_return_var;
    /// Directory listing command
    listing_command, set_listing_command;
    /// SFTP server binary
    sftp_server, set_sftp_server;
    /// Tunnel private key file
    tunnel_public_key_file, set_tunnel_public_key_file;
    /// Tunnel port forwarding specification
    tunnel_port_fwd, set_tunnel_port_fwd;
    /// Expected tunnel host key
    tunnel_host_key, set_tunnel_host_key;
    /// FTP account
    ftp_account, set_ftp_account;
    /// TLS client certificate
    tls_certificate_file, set_tls_certificate_file;
    /// Free custom parameter
    custom_param1, set_custom_param1;
    /// Free custom parameter
    custom_param2, set_custom_param2;
}

impl SessionData {
    /// UI selection marker
    pub fn selected(&self) -> bool {
        self.selected
    }

    /// Sets the selection marker without marking a change
    pub fn set_selected(&mut self, value: bool) {
        self.selected = value;
    }
}

/// Stores `value` encrypted under `key_material`, returning true if the
/// secret changed. An equal secret keeps its ciphertext.
fn replace_secret(
    codec: &dyn SecretCodec,
    cipher: &mut Vec<u8>,
    value: &str,
    key_material: &str,
) -> bool {
    if value.is_empty() {
        let changed = !cipher.is_empty();
        cipher.clear();
        return changed;
    }
    if !cipher.is_empty() && codec.decrypt(cipher, key_material).is_ok_and(|plain| plain == value) {
        return false;
    }
    *cipher = codec.encrypt(value, key_material);
    true
}

fn expand_env(value: &str) -> String {
    shellexpand::env(value).map_or_else(|_| value.to_string(), |expanded| expanded.into_owned())
}

fn expand_path(value: &str) -> String {
    shellexpand::full(value).map_or_else(|_| value.to_string(), |expanded| expanded.into_owned())
}

/// Case-insensitive comparison treating digit runs as numbers
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_digits = take_digits(&mut left);
                let r_digits = take_digits(&mut right);
                let l_trimmed = l_digits.trim_start_matches('0');
                let r_trimmed = r_digits.trim_start_matches('0');
                let order = l_trimmed
                    .len()
                    .cmp(&r_trimmed.len())
                    .then_with(|| l_trimmed.cmp(r_trimmed));
                if order != Ordering::Equal {
                    return order;
                }
            }
            (Some(l), Some(r)) => {
                let order = l.to_lowercase().cmp(r.to_lowercase());
                if order != Ordering::Equal {
                    return order;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}
