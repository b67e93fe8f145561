//! Enumerations used by session descriptors
//!
//! Every enumeration that reaches storage carries the integer value it is
//! persisted with, so stored profiles stay readable across versions.

use std::fmt;

/// Default SSH port
pub const SSH_PORT: u16 = 22;
/// Default FTP control port
pub const FTP_PORT: u16 = 21;
/// Default implicit FTPS port
pub const FTPS_IMPLICIT_PORT: u16 = 990;
/// Default HTTP port
pub const HTTP_PORT: u16 = 80;
/// Default HTTPS port
pub const HTTPS_PORT: u16 = 443;

macro_rules! stored_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Integer value used in storage
            #[must_use]
            pub const fn index(self) -> i64 {
                self as i64
            }

            /// Converts a stored integer back, `None` if out of range
            #[must_use]
            pub fn from_index(value: i64) -> Option<Self> {
                Self::ALL.iter().copied().find(|variant| variant.index() == value)
            }
        }
    };
}

stored_enum! {
    /// File transfer protocol of a session
    pub enum FsProtocol {
        /// SCP only
        ScpOnly = 0,
        /// SFTP, falling back to SCP
        Sftp = 1,
        /// SFTP only
        SftpOnly = 2,
        /// FTP, optionally with TLS
        Ftp = 5,
        /// WebDAV, optionally over TLS
        WebDav = 6,
    }
}

impl FsProtocol {
    /// Returns true for protocols running over SSH
    #[must_use]
    pub const fn is_ssh(self) -> bool {
        matches!(self, Self::ScpOnly | Self::Sftp | Self::SftpOnly)
    }

    /// Human readable name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::ScpOnly => "SCP",
            Self::Sftp => "SFTP (SCP)",
            Self::SftpOnly => "SFTP",
            Self::Ftp => "FTP",
            Self::WebDav => "WebDAV",
        }
    }
}

impl fmt::Display for FsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

stored_enum! {
    /// TLS mode for FTP and WebDAV
    pub enum Ftps {
        /// Plain connection
        None = 0,
        /// TLS from the first byte
        Implicit = 1,
        /// Explicit `AUTH SSL`
        ExplicitSsl = 2,
        /// Explicit `AUTH TLS`
        ExplicitTls = 3,
    }
}

stored_enum! {
    /// Preferred IP address family
    pub enum AddressFamily {
        /// Whatever the resolver returns
        Auto = 0,
        /// IPv4 only
        Ipv4 = 1,
        /// IPv6 only
        Ipv6 = 2,
    }
}

stored_enum! {
    /// Tri-state switch
    pub enum AutoSwitch {
        /// Forced on
        On = 0,
        /// Forced off
        Off = 1,
        /// Detected automatically
        Auto = 2,
    }
}

stored_enum! {
    /// Keepalive strategy
    pub enum PingType {
        /// No keepalives
        Off = 0,
        /// Protocol level null packets
        NullPacket = 1,
        /// Harmless protocol command
        DummyCommand = 2,
    }
}

stored_enum! {
    /// Proxy kind
    pub enum ProxyMethod {
        /// Direct connection
        None = 0,
        /// SOCKS4
        Socks4 = 1,
        /// SOCKS5
        Socks5 = 2,
        /// HTTP CONNECT
        Http = 3,
        /// Telnet proxy
        Telnet = 4,
        /// Local proxy command
        Command = 5,
    }
}

stored_enum! {
    /// Accepted SSH protocol versions
    pub enum SshProt {
        /// SSH-1 only
        Ssh1Only = 0,
        /// SSH-1 preferred
        Ssh1 = 1,
        /// SSH-2 preferred
        Ssh2 = 2,
        /// SSH-2 only
        Ssh2Only = 3,
    }
}

stored_enum! {
    /// Daylight saving time adjustment of remote timestamps
    pub enum DstMode {
        /// Windows style
        Win = 0,
        /// Unix style
        Unix = 1,
        /// Keep remote values
        Keep = 2,
    }
}

stored_enum! {
    /// Remote end-of-line convention
    pub enum EolType {
        /// `\n`
        Lf = 0,
        /// `\r\n`
        CrLf = 1,
        /// `\r`
        Cr = 2,
    }
}

stored_enum! {
    /// TLS protocol versions
    pub enum TlsVersion {
        /// SSL 2.0
        Ssl2 = 2,
        /// SSL 3.0
        Ssl3 = 3,
        /// TLS 1.0
        Tls10 = 10,
        /// TLS 1.1
        Tls11 = 11,
        /// TLS 1.2
        Tls12 = 12,
    }
}

/// Where a descriptor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionSource {
    /// Built on the fly
    #[default]
    AdHoc,
    /// Loaded from the profile store
    Stored,
    /// Loaded from the profile store and changed since
    StoredModified,
}

impl SessionSource {
    /// Label shown to users
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AdHoc => "Ad-Hoc site",
            Self::Stored => "Site",
            Self::StoredModified => "Modified site",
        }
    }
}

/// Server bugs the SSH layer can work around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SshBug {
    /// Chokes on SSH-1 ignore messages
    Ignore1,
    /// Refuses all SSH-1 password camouflage
    PlainPw1,
    /// Chokes on SSH-1 RSA authentication
    Rsa1,
    /// Miscomputes SSH-2 HMAC keys
    Hmac2,
    /// Miscomputes SSH-2 encryption keys
    DeriveKey2,
    /// Requires padding on SSH-2 RSA signatures
    RsaPad2,
    /// Misuses the session ID in SSH-2 PK auth
    PkSessId2,
    /// Handles SSH-2 key re-exchange badly
    Rekey2,
    /// Ignores SSH-2 maximum packet size
    MaxPkt2,
    /// Chokes on SSH-2 ignore messages
    Ignore2,
    /// Only supports pre-RFC4419 SSH-2 DH GEX
    OldGex2,
    /// Winadj requests
    WinAdj,
}

impl SshBug {
    /// Number of bug switches
    pub const COUNT: usize = 12;

    /// Every bug in storage order
    pub const ALL: [Self; Self::COUNT] = [
        Self::Ignore1,
        Self::PlainPw1,
        Self::Rsa1,
        Self::Hmac2,
        Self::DeriveKey2,
        Self::RsaPad2,
        Self::PkSessId2,
        Self::Rekey2,
        Self::MaxPkt2,
        Self::Ignore2,
        Self::OldGex2,
        Self::WinAdj,
    ];

    /// Storage key of the switch
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Ignore1 => "BugIgnore1",
            Self::PlainPw1 => "BugPlainPW1",
            Self::Rsa1 => "BugRSA1",
            Self::Hmac2 => "BugHMAC2",
            Self::DeriveKey2 => "BugDeriveKey2",
            Self::RsaPad2 => "BugRSAPad2",
            Self::PkSessId2 => "BugPKSessID2",
            Self::Rekey2 => "BugRekey2",
            Self::MaxPkt2 => "BugMaxPkt2",
            Self::Ignore2 => "BugIgnore2",
            Self::OldGex2 => "BugOldGex2",
            Self::WinAdj => "BugWinAdj",
        }
    }

    pub(crate) const fn slot(self) -> usize {
        self as usize
    }
}

/// SFTP server bugs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SftpBug {
    /// Reversed symlink arguments
    Symlink,
    /// Signed 32-bit timestamps
    SignedTs,
}

impl SftpBug {
    /// Number of bug switches
    pub const COUNT: usize = 2;

    /// Every bug in storage order
    pub const ALL: [Self; Self::COUNT] = [Self::Symlink, Self::SignedTs];

    /// Storage key of the switch
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Symlink => "SFTPSymlinkBug",
            Self::SignedTs => "SFTPSignedTSBug",
        }
    }

    pub(crate) const fn slot(self) -> usize {
        self as usize
    }
}

/// Returns the well-known port for a protocol and TLS mode
#[must_use]
pub const fn default_port(protocol: FsProtocol, ftps: Ftps) -> u16 {
    match protocol {
        FsProtocol::Ftp => {
            if matches!(ftps, Ftps::Implicit) {
                FTPS_IMPLICIT_PORT
            } else {
                FTP_PORT
            }
        }
        FsProtocol::WebDav => {
            if matches!(ftps, Ftps::None) {
                HTTP_PORT
            } else {
                HTTPS_PORT
            }
        }
        FsProtocol::ScpOnly | FsProtocol::Sftp | FsProtocol::SftpOnly => SSH_PORT,
    }
}
