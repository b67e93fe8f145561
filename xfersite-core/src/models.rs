//! Core data models for `XferSite`
//!
//! This module defines the session descriptor, the enumerations its settings
//! use and the declarative property table driving persistence and
//! comparison.

mod properties;
mod protocol;
mod session;

pub use properties::{find_property, Property, PropertyGroup, PropertyValue, PROPERTIES};
pub(crate) use properties::{Conversion, Persist};
pub use protocol::{
    default_port, AddressFamily, AutoSwitch, DstMode, EolType, FsProtocol, Ftps, PingType,
    ProxyMethod, SessionSource, SftpBug, SshBug, SshProt, TlsVersion, FTPS_IMPLICIT_PORT,
    FTP_PORT, HTTPS_PORT, HTTP_PORT, SSH_PORT,
};
pub use session::{
    natural_cmp, SessionData, ANONYMOUS_PASSWORD, ANONYMOUS_USER_NAME, DEFAULT_SESSION_NAME,
    HIDDEN_PREFIX, PUTTY_SSH_PROTOCOL,
};
