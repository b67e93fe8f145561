//! SSH algorithm preference lists
//!
//! Cipher and key-exchange preferences are stored as comma separated names.
//! A user-edited list is merged with the built-in default ordering so that
//! algorithms added in later releases find a sensible place without
//! disturbing the user's own ordering. The `WARN` entry marks the point
//! below which algorithms are considered insecure and is always present.

use std::fmt;

/// An algorithm family with a closed set of members and a default ordering.
pub trait Algorithm: Copy + Eq + fmt::Debug + 'static {
    /// Every member, including the warning sentinel
    const ALL: &'static [Self];

    /// Built-in preference order, a permutation of [`Self::ALL`]
    const DEFAULT_ORDER: &'static [Self];

    /// The "warn below this line" sentinel
    const WARN: Self;

    /// Storage name of the member
    fn name(self) -> &'static str;

    /// Looks a member up by its storage name (case-insensitive)
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.name().eq_ignore_ascii_case(name))
    }
}

/// SSH encryption ciphers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cipher {
    /// Warning sentinel
    Warn,
    /// Triple DES
    TripleDes,
    /// Blowfish
    Blowfish,
    /// AES (SSH-2 only)
    Aes,
    /// Single DES
    Des,
    /// Arcfour (RC4)
    Arcfour,
    /// ChaCha20-Poly1305
    ChaCha20,
}

impl Algorithm for Cipher {
    const ALL: &'static [Self] = &[
        Self::Warn,
        Self::TripleDes,
        Self::Blowfish,
        Self::Aes,
        Self::Des,
        Self::Arcfour,
        Self::ChaCha20,
    ];

    const DEFAULT_ORDER: &'static [Self] = &[
        Self::Aes,
        Self::Blowfish,
        Self::ChaCha20,
        Self::TripleDes,
        Self::Warn,
        Self::Arcfour,
        Self::Des,
    ];

    const WARN: Self = Self::Warn;

    fn name(self) -> &'static str {
        match self {
            Self::Warn => "WARN",
            Self::TripleDes => "3des",
            Self::Blowfish => "blowfish",
            Self::Aes => "aes",
            Self::Des => "des",
            Self::Arcfour => "arcfour",
            Self::ChaCha20 => "chacha20",
        }
    }
}

/// SSH key exchange methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kex {
    /// Warning sentinel
    Warn,
    /// Diffie-Hellman group 1 (SHA-1)
    DhGroup1Sha1,
    /// Diffie-Hellman group 14 (SHA-1)
    DhGroup14Sha1,
    /// Diffie-Hellman group exchange (SHA-1)
    DhGexSha1,
    /// RSA key exchange
    Rsa,
    /// Elliptic-curve Diffie-Hellman
    Ecdh,
}

impl Algorithm for Kex {
    const ALL: &'static [Self] = &[
        Self::Warn,
        Self::DhGroup1Sha1,
        Self::DhGroup14Sha1,
        Self::DhGexSha1,
        Self::Rsa,
        Self::Ecdh,
    ];

    const DEFAULT_ORDER: &'static [Self] = &[
        Self::Ecdh,
        Self::DhGexSha1,
        Self::DhGroup14Sha1,
        Self::DhGroup1Sha1,
        Self::Rsa,
        Self::Warn,
    ];

    const WARN: Self = Self::Warn;

    fn name(self) -> &'static str {
        match self {
            Self::Warn => "WARN",
            Self::DhGroup1Sha1 => "dh-group1-sha1",
            Self::DhGroup14Sha1 => "dh-group14-sha1",
            Self::DhGexSha1 => "dh-gex-sha1",
            Self::Rsa => "rsa",
            Self::Ecdh => "ecdh",
        }
    }
}

/// Parses a comma separated list, dropping unknown names and repeats.
#[must_use]
pub fn parse_list<A: Algorithm>(text: &str) -> Vec<A> {
    let mut parsed: Vec<A> = Vec::with_capacity(A::ALL.len());
    for token in text.split(',') {
        if let Some(algorithm) = A::from_name(token) {
            if !parsed.contains(&algorithm) {
                parsed.push(algorithm);
            }
        }
    }
    parsed
}

/// Renders a list in its storage form.
#[must_use]
pub fn format_list<A: Algorithm>(list: &[A]) -> String {
    list.iter()
        .map(|algorithm| algorithm.name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Merges a user ordering with `defaults`.
///
/// Defaults missing from `user` are placed as follows: while the leading
/// defaults are all missing they keep their default position at the front;
/// once a default already present in `user` is seen, missing defaults that
/// rank above the sentinel go just before it and the rest are appended.
///
/// The result always holds every member exactly once.
#[must_use]
pub fn merge<A: Algorithm>(user: &[A], defaults: &[A]) -> Vec<A> {
    let mut merged: Vec<A> = Vec::with_capacity(A::ALL.len());
    for &algorithm in user {
        if !merged.contains(&algorithm) {
            merged.push(algorithm);
        }
    }
    if !merged.contains(&A::WARN) {
        merged.push(A::WARN);
    }

    let mut warn_index = position(&merged, A::WARN);
    let warn_default_index = position(defaults, A::WARN);
    let mut priority = true;

    for (default_index, &algorithm) in defaults.iter().enumerate() {
        if merged.contains(&algorithm) {
            priority = false;
            continue;
        }

        let target = if priority {
            default_index
        } else if default_index < warn_default_index {
            warn_index
        } else {
            merged.len()
        };
        let target = target.min(merged.len());

        merged.insert(target, algorithm);
        if target <= warn_index {
            warn_index += 1;
        }
    }

    merged
}

/// Parses `text` and merges it with the family's default ordering.
#[must_use]
pub fn merge_text<A: Algorithm>(text: &str) -> Vec<A> {
    merge(&parse_list::<A>(text), A::DEFAULT_ORDER)
}

fn position<A: Algorithm>(list: &[A], wanted: A) -> usize {
    list.iter()
        .position(|&algorithm| algorithm == wanted)
        .unwrap_or(list.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEX_DEFAULT: &str = "ecdh,dh-gex-sha1,dh-group14-sha1,dh-group1-sha1,rsa,WARN";
    const CIPHER_DEFAULT: &str = "aes,blowfish,chacha20,3des,WARN,arcfour,des";

    fn kex(text: &str) -> String {
        format_list(&merge_text::<Kex>(text))
    }

    fn cipher(text: &str) -> String {
        format_list(&merge_text::<Cipher>(text))
    }

    #[test]
    fn test_defaults_render() {
        assert_eq!(format_list(Kex::DEFAULT_ORDER), KEX_DEFAULT);
        assert_eq!(format_list(Cipher::DEFAULT_ORDER), CIPHER_DEFAULT);
    }

    #[test]
    fn test_kex_merge() {
        assert_eq!(kex(""), KEX_DEFAULT);
        assert_eq!(kex("dh-gex-sha1,dh-group14-sha1,dh-group1-sha1,rsa,WARN"), KEX_DEFAULT);
        assert_eq!(
            kex("dh-group14-sha1,dh-group1-sha1,WARN"),
            "ecdh,dh-gex-sha1,dh-group14-sha1,dh-group1-sha1,rsa,WARN"
        );
        assert_eq!(
            kex("dh-group14-sha1,dh-group1-sha1"),
            "ecdh,dh-gex-sha1,dh-group14-sha1,dh-group1-sha1,rsa,WARN"
        );
        assert_eq!(
            kex("dh-gex-sha1,WARN,dh-group14-sha1,dh-group1-sha1,rsa"),
            "ecdh,dh-gex-sha1,WARN,dh-group14-sha1,dh-group1-sha1,rsa"
        );
    }

    #[test]
    fn test_kex_unknown_tokens_ignored() {
        assert_eq!(kex("foo,ecdh,dh-gex-sha1,dh-group14-sha1,dh-group1-sha1,rsa,WARN"), KEX_DEFAULT);
        assert_eq!(kex("ecdh,dh-gex-sha1,foo,dh-group14-sha1,dh-group1-sha1,rsa,WARN"), KEX_DEFAULT);
        assert_eq!(kex("ecdh,dh-gex-sha1,dh-group14-sha1,dh-group1-sha1,rsa,WARN,foo"), KEX_DEFAULT);
        assert_eq!(kex("foo,bar"), KEX_DEFAULT);
    }

    #[test]
    fn test_cipher_merge() {
        assert_eq!(cipher(""), CIPHER_DEFAULT);
        assert_eq!(
            cipher("aes,blowfish,3des,WARN,arcfour,des"),
            "aes,blowfish,3des,chacha20,WARN,arcfour,des"
        );
        assert_eq!(cipher("blowfish,chacha20,3des,WARN,arcfour,des"), CIPHER_DEFAULT);
        assert_eq!(
            cipher("aes,chacha20,3des,WARN,arcfour,des"),
            "aes,chacha20,3des,blowfish,WARN,arcfour,des"
        );
        assert_eq!(cipher("aes,blowfish,chacha20,3des,WARN,arcfour"), CIPHER_DEFAULT);
        assert_eq!(
            cipher("aes,blowfish,chacha20,3des,WARN,des"),
            "aes,blowfish,chacha20,3des,WARN,des,arcfour"
        );
    }

    #[test]
    fn test_names_case_insensitive_and_deduplicated() {
        assert_eq!(parse_list::<Cipher>(" AES , aes,Blowfish"), vec![Cipher::Aes, Cipher::Blowfish]);
        assert_eq!(Kex::from_name("warn"), Some(Kex::Warn));
        assert_eq!(Kex::from_name("curve"), None);
    }
}
