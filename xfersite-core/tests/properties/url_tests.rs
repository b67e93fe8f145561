//! Property-based tests for session URL generation and resolution

use proptest::prelude::*;
use xfersite_core::url::{is_url, SessionUrlFlags, MASKED_PASSWORD};
use xfersite_core::{FsProtocol, Ftps, SessionData};

// ============================================================================
// Generators
// ============================================================================

/// Strategy for protocol and TLS combinations a URL can express
fn arb_protocol() -> impl Strategy<Value = (FsProtocol, Ftps)> {
    prop_oneof![
        Just((FsProtocol::ScpOnly, Ftps::None)),
        Just((FsProtocol::SftpOnly, Ftps::None)),
        Just((FsProtocol::Ftp, Ftps::None)),
        Just((FsProtocol::Ftp, Ftps::Implicit)),
        Just((FsProtocol::Ftp, Ftps::ExplicitTls)),
        Just((FsProtocol::WebDav, Ftps::None)),
        Just((FsProtocol::WebDav, Ftps::Implicit)),
    ]
}

/// Strategy for valid hostnames
fn arb_host() -> impl Strategy<Value = String> {
    "[a-z0-9]([a-z0-9-]{0,15}[a-z0-9])?(\\.[a-z0-9]([a-z0-9-]{0,15}[a-z0-9])?)*"
}

/// Strategy for valid ports (non-zero)
fn arb_port() -> impl Strategy<Value = u16> {
    1u16..=65535u16
}

/// Strategy for passwords made of any printable characters
fn arb_password() -> impl Strategy<Value = String> {
    "[ -~]{1,16}"
}

fn site(protocol: (FsProtocol, Ftps), host: &str, port: u16, user: &str) -> SessionData {
    let mut data = SessionData::new("");
    data.set_fs_protocol(protocol.0);
    data.set_ftps(protocol.1);
    data.set_host_name(host);
    data.set_port_number(port);
    data.set_user_name(user);
    data
}

// ============================================================================
// Round trips
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A generated URL resolves to the same connection target.
    #[test]
    fn prop_generated_url_resolves_back(
        protocol in arb_protocol(),
        host in arb_host(),
        port in arb_port(),
        user in "[a-z][a-z0-9._-]{0,10}",
        password in arb_password(),
    ) {
        let mut original = site(protocol, &host, port, &user);
        original.set_password(&password);

        let url = original.generate_session_url(SessionUrlFlags::OPEN);
        prop_assert!(is_url(&url), "{} is not a URL", url);

        let mut parsed = SessionData::new("");
        let outcome = parsed.parse_url(&url, None, None, false).unwrap();
        prop_assert!(outcome.protocol_defined);
        prop_assert!(!outcome.defaults_only);
        prop_assert_eq!(parsed.fs_protocol(), protocol.0);
        prop_assert_eq!(parsed.ftps(), protocol.1);
        prop_assert_eq!(parsed.host_name(), host.as_str());
        prop_assert_eq!(parsed.port_number(), port);
        prop_assert_eq!(parsed.user_name(), user.as_str());
        prop_assert_eq!(parsed.password(), password);
    }

    /// The masked URL never carries the password.
    #[test]
    fn prop_masked_url_hides_password(
        host in arb_host(),
        password in "[A-Za-z0-9]{6,16}",
    ) {
        let url = format!("sftp://admin:{password}@{host}/");
        let mut parsed = SessionData::new("");
        let outcome = parsed.parse_url(&url, None, None, false).unwrap();
        prop_assert_eq!(
            outcome.masked_url,
            format!("sftp://admin:{MASKED_PASSWORD}@{host}/")
        );
        prop_assert_eq!(parsed.password(), password);
    }

    /// The port is spelled out only when it is not the protocol default.
    #[test]
    fn prop_url_port_only_when_custom(
        protocol in arb_protocol(),
        host in arb_host(),
        port in arb_port(),
    ) {
        let data = site(protocol, &host, port, "");
        let url = data.generate_session_url(SessionUrlFlags::default());
        let has_port = url.ends_with(&format!(":{port}/"));
        prop_assert_eq!(has_port, port != data.default_port(), "{}", url);
        prop_assert!(url.ends_with('/'));
    }

    /// IPv6 addresses are bracketed and resolve back.
    #[test]
    fn prop_ipv6_host_round_trip(groups in prop::collection::vec(1u16..=0xffff, 2..=8)) {
        let host = groups
            .iter()
            .map(|group| format!("{group:x}"))
            .collect::<Vec<_>>()
            .join("::");
        let data = site((FsProtocol::SftpOnly, Ftps::None), &host, 2222, "");
        let url = data.generate_session_url(SessionUrlFlags::default());
        prop_assert!(url.contains(&format!("[{host}]:2222")), "{}", url);

        let mut parsed = SessionData::new("");
        parsed.parse_url(&url, None, None, false).unwrap();
        prop_assert_eq!(parsed.host_name(), host.as_str());
        prop_assert_eq!(parsed.port_number(), 2222);
    }

    /// Text without a scheme is never taken for a URL.
    #[test]
    fn prop_plain_names_are_not_urls(name in "[a-z0-9 _-]{0,20}") {
        prop_assert!(!is_url(&name));
    }
}
