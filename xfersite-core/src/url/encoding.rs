//! Percent encoding of URL components

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as they are inside a URL component
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Decodes `%XX` escapes and `+` as space.
///
/// Invalid escapes are kept literally and invalid UTF-8 is replaced.
#[must_use]
pub fn decode_url_chars(text: &str) -> String {
    let spaced: Cow<'_, str> = if text.contains('+') {
        Cow::Owned(text.replace('+', " "))
    } else {
        Cow::Borrowed(text)
    };
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Escapes everything but unreserved characters
#[must_use]
pub fn encode_url_string(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

/// Returns true for a bare IPv6 address such as `::1` or `fe80::1`
#[must_use]
pub fn is_ipv6_literal(host: &str) -> bool {
    host.contains(':') && host.chars().all(|c| c == ':' || c.is_ascii_hexdigit())
}

/// Wraps an IPv6 address in brackets, leaves other hosts alone
#[must_use]
pub fn escape_ipv6_literal(host: &str) -> Cow<'_, str> {
    if is_ipv6_literal(host) {
        Cow::Owned(format!("[{host}]"))
    } else {
        Cow::Borrowed(host)
    }
}
