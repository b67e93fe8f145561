//! Rendering a descriptor back into a URL

use crate::models::{FsProtocol, Ftps, SessionData};

use super::encoding::{encode_url_string, escape_ipv6_literal};
use super::PRODUCT_PROTOCOL_PREFIX;

/// Separator replacing spaces in a fingerprint embedded in a URL
const FINGERPRINT_SEPARATOR: char = '-';

/// Parts to include in a generated session URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SessionUrlFlags {
    /// Prefix the scheme with the product marker
    pub product_prefix: bool,
    /// Include the user name
    pub user_name: bool,
    /// Include the password (requires the user name)
    pub password: bool,
    /// Include the host key fingerprint (requires the user name)
    pub host_key: bool,
}

impl SessionUrlFlags {
    /// User name and password, for opening a site
    pub const OPEN: Self = Self {
        product_prefix: false,
        user_name: true,
        password: true,
        host_key: false,
    };

    /// Everything identifying a site
    pub const SESSION: Self = Self {
        product_prefix: false,
        user_name: true,
        password: true,
        host_key: true,
    };
}

/// Normalizes a fingerprint for embedding in a URL
#[must_use]
pub fn normalize_fingerprint(fingerprint: &str) -> String {
    fingerprint
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(&FINGERPRINT_SEPARATOR.to_string())
}

impl SessionData {
    /// URL scheme of the protocol, including `://`
    #[must_use]
    pub fn protocol_url(&self, product_prefix: bool) -> String {
        let scheme = match self.fs_protocol() {
            FsProtocol::ScpOnly => "scp",
            FsProtocol::Sftp | FsProtocol::SftpOnly => "sftp",
            FsProtocol::Ftp => match self.ftps() {
                Ftps::Implicit => "ftps",
                Ftps::ExplicitTls | Ftps::ExplicitSsl => "ftpes",
                Ftps::None => "ftp",
            },
            FsProtocol::WebDav => match self.ftps() {
                Ftps::Implicit => "https",
                _ => "http",
            },
        };
        let prefix = if product_prefix { PRODUCT_PROTOCOL_PREFIX } else { "" };
        format!("{prefix}{scheme}://")
    }

    /// Renders the descriptor as a session URL.
    ///
    /// The port is included only when it differs from the protocol's
    /// default. The URL always ends with `/`.
    #[must_use]
    pub fn generate_session_url(&self, flags: SessionUrlFlags) -> String {
        let mut url = self.protocol_url(flags.product_prefix);

        if flags.user_name && !self.user_name().is_empty() {
            url.push_str(&encode_url_string(self.user_name()));

            if flags.password && self.has_password() {
                url.push(':');
                url.push_str(&encode_url_string(&self.password()));
            }

            if flags.host_key && !self.host_key().is_empty() {
                url.push_str(";fingerprint=");
                url.push_str(&encode_url_string(&normalize_fingerprint(self.host_key())));
            }

            url.push('@');
        }

        let host = self.host_name();
        let host = escape_ipv6_literal(host);
        if host.starts_with('[') {
            url.push_str(&host);
        } else {
            url.push_str(&encode_url_string(&host));
        }

        if self.port_number() != self.default_port() {
            url.push(':');
            url.push_str(&self.port_number().to_string());
        }
        url.push('/');
        url
    }
}
