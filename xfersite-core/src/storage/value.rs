//! Loosely typed storage values

use std::fmt;

/// A value held by a storage key.
///
/// Values are converted between types on read, so a value written as an integer
/// can be read back as a string and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageValue {
    /// Text
    String(String),
    /// Signed integer
    Integer(i64),
    /// Boolean
    Bool(bool),
    /// Floating point
    Float(f64),
}

impl StorageValue {
    /// Text rendering of the value
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Float(f) => f.to_string(),
        }
    }

    /// Integer view, `None` if not convertible
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::String(s) => s.trim().parse().ok(),
            Self::Integer(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            Self::Float(_) => None,
        }
    }

    /// Boolean view, `None` if not convertible
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Integer(i) => Some(*i != 0),
            Self::Float(f) => Some(*f != 0.0),
            Self::String(s) => parse_bool(s),
        }
    }

    /// Floating point view, `None` if not convertible
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => s.trim().parse().ok(),
        }
    }
}

/// Parses the boolean spellings accepted in settings and switches
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if ["1", "on", "true", "yes"]
        .iter()
        .any(|word| text.eq_ignore_ascii_case(word))
    {
        Some(true)
    } else if ["0", "off", "false", "no"]
        .iter()
        .any(|word| text.eq_ignore_ascii_case(word))
    {
        Some(false)
    } else {
        text.parse::<i64>().ok().map(|value| value != 0)
    }
}

impl fmt::Display for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
