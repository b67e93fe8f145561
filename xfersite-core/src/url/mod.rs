//! Session URL resolution
//!
//! Turns a user supplied string into a session descriptor. The string is
//! either the name of a stored site (optionally followed by a path) or a
//! connection URL of the form
//!
//! ```text
//! [xfersite-]scheme://[user[:password][;fingerprint=...]@]host[:port][/path][;save=1]
//! ```
//!
//! where the scheme and everything but the host are optional. Command-line
//! switches are applied on top of whatever the URL produced.

mod encoding;
mod generate;
mod options;

pub use encoding::{decode_url_chars, encode_url_string, escape_ipv6_literal, is_ipv6_literal};
pub use generate::{normalize_fingerprint, SessionUrlFlags};
pub use options::{SessionOptions, RAW_SETTINGS_SWITCH};

use crate::error::{SessionError, SessionResult};
use crate::models::{
    FsProtocol, Ftps, SessionData, FTPS_IMPLICIT_PORT, FTP_PORT, HTTPS_PORT, HTTP_PORT,
    PUTTY_SSH_PROTOCOL, SSH_PORT,
};
use crate::persistence::SessionPersistence;
use crate::sessions::StoredSessionList;

/// Marker that may precede the scheme, e.g. `xfersite-sftp://`
pub const PRODUCT_PROTOCOL_PREFIX: &str = "xfersite-";

/// Placeholder replacing the password in a masked URL
pub const MASKED_PASSWORD: &str = "***";

const PARAM_SEPARATOR: char = ';';
const PARAM_VALUE_SEPARATOR: char = '=';
const HOST_KEY_PARAM: &str = "fingerprint";
const SAVE_PARAM: &str = "save";

/// A recognized URL scheme
#[derive(Debug, Clone, Copy)]
struct UrlScheme {
    token: &'static str,
    protocol: FsProtocol,
    ftps: Ftps,
    port: u16,
    putty_ssh: bool,
}

const fn scheme(token: &'static str, protocol: FsProtocol, ftps: Ftps, port: u16) -> UrlScheme {
    UrlScheme {
        token,
        protocol,
        ftps,
        port,
        putty_ssh: false,
    }
}

/// Tried in this order, first match wins
const SCHEMES: [UrlScheme; 8] = [
    scheme("scp", FsProtocol::ScpOnly, Ftps::None, SSH_PORT),
    scheme("sftp", FsProtocol::SftpOnly, Ftps::None, SSH_PORT),
    scheme("ftp", FsProtocol::Ftp, Ftps::None, FTP_PORT),
    scheme("ftps", FsProtocol::Ftp, Ftps::Implicit, FTPS_IMPLICIT_PORT),
    scheme("ftpes", FsProtocol::Ftp, Ftps::ExplicitTls, FTP_PORT),
    scheme("http", FsProtocol::WebDav, Ftps::None, HTTP_PORT),
    scheme("https", FsProtocol::WebDav, Ftps::Implicit, HTTPS_PORT),
    UrlScheme {
        token: "ssh",
        protocol: FsProtocol::SftpOnly,
        ftps: Ftps::None,
        port: SSH_PORT,
        putty_ssh: true,
    },
];

/// What parsing a URL found out besides the descriptor itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParseOutcome {
    /// Nothing but at most a bare host name was given
    pub defaults_only: bool,
    /// Trailing file name split off the path, when requested
    pub file_name: Option<String>,
    /// The URL started with a known scheme
    pub protocol_defined: bool,
    /// The URL with the password replaced by [`MASKED_PASSWORD`]
    pub masked_url: String,
}

/// Returns true if `url` starts with a known scheme
#[must_use]
pub fn is_url(url: &str) -> bool {
    detect_scheme(url).is_some()
}

/// Strips a leading `scheme://` of a known protocol
pub(crate) fn remove_protocol_prefix(value: &str) -> &str {
    detect_scheme(value)
        .and_then(|(_, len)| value[len..].strip_prefix("//"))
        .unwrap_or(value)
}

/// Finds the scheme of `url` and the length of its `scheme:` prefix
fn detect_scheme(url: &str) -> Option<(UrlScheme, usize)> {
    SCHEMES.iter().find_map(|scheme| {
        ["", PRODUCT_PROTOCOL_PREFIX].iter().find_map(|prefix| {
            let len = prefix.len() + scheme.token.len() + 1;
            let head = url.get(..len)?;
            let marker = head.get(..prefix.len())?;
            let token = head.get(prefix.len()..len - 1)?;
            (marker.eq_ignore_ascii_case(prefix)
                && token.eq_ignore_ascii_case(scheme.token)
                && head.ends_with(':'))
            .then_some((*scheme, len))
        })
    })
}

/// Length of the shortest prefix of `encoded` decoding to `name`
fn encoded_prefix_len(encoded: &str, name: &str) -> usize {
    encoded
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .find(|&end| decode_url_chars(&encoded[..end]).eq_ignore_ascii_case(name))
        .unwrap_or(encoded.len())
}

/// Splits `host[:port]` or `[v6]:port`, returning the host and raw port
fn split_host_port(host_info: &str) -> (String, &str) {
    if host_info.len() >= 2 && host_info.starts_with('[') {
        if let Some(close) = host_info.find(']') {
            let after = &host_info[close + 1..];
            return (
                host_info[1..close].to_string(),
                after.strip_prefix(':').unwrap_or(after),
            );
        }
    }
    match host_info.split_once(':') {
        Some((host, port)) => (decode_url_chars(host), port),
        None => (decode_url_chars(host_info), ""),
    }
}

/// `name=value` pairs of a `;`-separated parameter list
fn url_params(params: &str) -> impl Iterator<Item = (&str, &str)> {
    params
        .split(PARAM_SEPARATOR)
        .filter(|param| !param.is_empty())
        .map(|param| param.split_once(PARAM_VALUE_SEPARATOR).unwrap_or((param, "")))
}

/// Result of parsing the raw connection string
struct RawTarget {
    remote_directory: String,
    port_defined: bool,
    bare_host: bool,
}

impl SessionData {
    /// Resolves `url` into this descriptor.
    ///
    /// With a site collection the URL is first matched against stored
    /// sites; a matched hidden site is consumed and its removal persisted.
    /// Otherwise the descriptor is seeded from the collection's default
    /// settings and the URL is parsed as a connection string. `options`
    /// are applied last.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSwitch` for an unusable switch value
    /// and a storage error if consuming a hidden site cannot be persisted.
    pub fn parse_url(
        &mut self,
        url: &str,
        options: Option<&SessionOptions>,
        mut sessions: Option<&mut StoredSessionList>,
        extract_file_name: bool,
    ) -> SessionResult<UrlParseOutcome> {
        let scheme = detect_scheme(url);
        let mut masked_url = String::new();
        let mut rest = url;
        if let Some((_, len)) = scheme {
            masked_url.push_str(&url[..len]);
            rest = &url[len..];
            if let Some(stripped) = rest.strip_prefix("//") {
                masked_url.push_str("//");
                rest = stripped;
            }
        }
        let scheme = scheme.map(|(scheme, _)| scheme);

        let mut port_defined = false;
        let mut defaults_only = scheme.is_none();
        let mut file_name = None;

        if rest.is_empty() {
            if let Some(list) = sessions.as_deref() {
                self.copy_data(list.default_settings());
            }
        } else {
            let decoded = decode_url_chars(rest);
            let matched = sessions
                .as_deref()
                .and_then(|list| list.find_url_match(&decoded))
                .map(|(index, stored)| (index, stored.clone()));

            let mut remote_directory = match (matched, sessions.as_deref_mut()) {
                (Some((index, stored)), Some(list)) => {
                    defaults_only = false;
                    self.assign(&stored);
                    let remote = rest[encoded_prefix_len(rest, stored.name())..].to_string();
                    if stored.hidden() {
                        list.consume_hidden(index)?;
                    }
                    masked_url.push_str(rest);
                    remote
                }
                (_, list) => {
                    if let Some(list) = list {
                        self.copy_data(list.default_settings());
                    }
                    self.set_name("");
                    let target = self.parse_connection_string(rest, scheme, &mut masked_url);
                    port_defined = target.port_defined;
                    defaults_only &= target.bare_host;
                    target.remote_directory
                }
            };

            if !remote_directory.is_empty() && remote_directory != "/" {
                if extract_file_name && !remote_directory.ends_with('/') {
                    let split = remote_directory.rfind('/').map_or(0, |slash| slash + 1);
                    file_name = Some(decode_url_chars(&remote_directory[split..]));
                    remote_directory.truncate(split);
                }
                self.set_remote_directory(decode_url_chars(&remote_directory));
            }
        }

        if let Some(scheme) = scheme {
            self.set_fs_protocol(scheme.protocol);
            if scheme.putty_ssh {
                self.set_putty_protocol(PUTTY_SSH_PROTOCOL);
            }
        }

        if let Some(options) = options {
            let persistence = sessions
                .as_deref()
                .map_or_else(SessionPersistence::new, |list| *list.persistence());
            self.apply_switches(options, port_defined, &persistence)?;
        }

        if let Some(name) = &file_name {
            tracing::debug!(file = %name, "Split file name off the URL path");
        }

        Ok(UrlParseOutcome {
            defaults_only,
            file_name,
            protocol_defined: scheme.is_some(),
            masked_url,
        })
    }

    /// Parses `[user[:password][;params]@]host[:port][/path[;params]]`
    fn parse_connection_string(
        &mut self,
        rest: &str,
        scheme: Option<UrlScheme>,
        masked_url: &mut String,
    ) -> RawTarget {
        let (connect_info, path) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
        let (user_info, host_info) = match connect_info.rfind('@') {
            Some(at) => (&connect_info[..at], &connect_info[at + 1..]),
            None => ("", connect_info),
        };

        let (host, port_text) = split_host_port(host_info);
        self.set_host_name(host);

        let port_defined = !port_text.is_empty();
        if port_defined {
            match decode_url_chars(port_text).trim().parse::<u16>() {
                Ok(port) => self.set_port_number(port),
                Err(_) => tracing::debug!(port = %port_text, "Ignoring malformed port"),
            }
        } else if let Some(scheme) = scheme {
            self.set_port_number(scheme.port);
        }

        if let Some(scheme) = scheme {
            self.set_ftps(scheme.ftps);
        }

        let (credentials, connection_params) =
            user_info.split_once(PARAM_SEPARATOR).unwrap_or((user_info, ""));
        for (name, value) in url_params(connection_params) {
            if name.eq_ignore_ascii_case(HOST_KEY_PARAM) {
                self.set_host_key(decode_url_chars(value));
                self.set_override_cached_host_key(false);
            }
        }

        let (raw_user_name, raw_password) = credentials.split_once(':').unwrap_or((credentials, ""));
        self.set_user_name(decode_url_chars(raw_user_name));
        self.set_password(&decode_url_chars(raw_password));

        let (remote_directory, session_params) =
            path.split_once(PARAM_SEPARATOR).unwrap_or((path, ""));
        for (name, value) in url_params(session_params) {
            if name.eq_ignore_ascii_case(SAVE_PARAM) {
                let save = value.trim().parse::<i64>().unwrap_or(1);
                self.set_save_only(save != 0);
            }
        }

        masked_url.push_str(raw_user_name);
        if !raw_password.is_empty() {
            masked_url.push(':');
            masked_url.push_str(MASKED_PASSWORD);
        }
        if !raw_user_name.is_empty() || !raw_password.is_empty() {
            masked_url.push('@');
        }
        masked_url.push_str(host_info);
        masked_url.push_str(remote_directory);

        RawTarget {
            remote_directory: remote_directory.to_string(),
            port_defined,
            bare_host: user_info.is_empty() && !port_defined && path.is_empty(),
        }
    }

    fn apply_switches(
        &mut self,
        options: &SessionOptions,
        port_defined: bool,
        persistence: &SessionPersistence,
    ) -> SessionResult<()> {
        if let Some(value) = options.find_switch("sessionname") {
            self.set_name(value);
        }
        if let Some(value) = options.find_switch("privatekey") {
            self.set_public_key_file(value);
        }
        if let Some(value) = options.find_switch("clientcert") {
            self.set_tls_certificate_file(value);
        }
        if let Some(value) = options.find_switch("passphrase") {
            self.set_passphrase(value);
        }
        if let Some(value) = options.find_switch("timeout") {
            let timeout = value.trim().parse::<u32>().map_err(|_| SessionError::InvalidSwitch {
                switch: "timeout".to_string(),
                value: value.to_string(),
            })?;
            self.set_timeout(timeout);
        }
        for switch in ["hostkey", "certificate"] {
            if let Some(value) = options.find_switch(switch) {
                self.set_host_key(value);
                self.set_override_cached_host_key(true);
            }
        }

        let passive = options.switch_value("passive", self.ftp_pasv_mode())?;
        self.set_ftp_pasv_mode(passive);

        if options.has_switch("implicit") {
            let enabled = options.switch_value("implicit", true)?;
            self.set_ftps(if enabled { Ftps::Implicit } else { Ftps::None });
            if enabled && !port_defined {
                self.set_port_number(FTPS_IMPLICIT_PORT);
            }
        }
        if options.has_switch("explicitssl") {
            self.apply_explicit_switch(options, "explicitssl", Ftps::ExplicitSsl, port_defined)?;
        }
        for switch in ["explicit", "explicittls"] {
            if options.has_switch(switch) {
                self.apply_explicit_switch(options, switch, Ftps::ExplicitTls, port_defined)?;
            }
        }

        if options.has_switch(RAW_SETTINGS_SWITCH) {
            tracing::debug!(count = options.raw_settings().len(), "Applying raw settings");
            persistence.apply_raw_settings(self, options.raw_settings().iter().cloned());
        }
        Ok(())
    }

    fn apply_explicit_switch(
        &mut self,
        options: &SessionOptions,
        switch: &str,
        mode: Ftps,
        port_defined: bool,
    ) -> SessionResult<()> {
        let enabled = options.switch_value(switch, true)?;
        self.set_ftps(if enabled { mode } else { Ftps::None });
        if enabled && !port_defined {
            self.set_port_number(FTP_PORT);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
