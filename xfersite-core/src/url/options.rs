//! Command-line switches overlaid on a resolved URL

use crate::error::{SessionError, SessionResult};
use crate::storage::parse_bool;

/// Switch carrying raw `name=value` settings
pub const RAW_SETTINGS_SWITCH: &str = "rawsettings";

/// Switches given next to a session URL.
///
/// Switch names are case-insensitive. A switch given without a value reads
/// as enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    switches: Vec<(String, Option<String>)>,
    raw_settings: Vec<(String, String)>,
}

impl SessionOptions {
    /// Creates an empty switch set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses command-line style arguments.
    ///
    /// Switches start with `-` or `/` and may carry `=value`. Arguments
    /// following `-rawsettings` are `name=value` settings up to the next
    /// switch. Other arguments are ignored.
    #[must_use]
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::new();
        let mut in_raw_settings = false;
        for arg in args {
            let arg = arg.as_ref();
            if let Some(switch) = arg.strip_prefix('-').or_else(|| arg.strip_prefix('/')) {
                let switch = switch.trim_start_matches('-');
                let (name, value) = match switch.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (switch, None),
                };
                in_raw_settings = name.eq_ignore_ascii_case(RAW_SETTINGS_SWITCH);
                options = options.with_switch(name, value);
            } else if in_raw_settings {
                if let Some((name, value)) = arg.split_once('=') {
                    options = options.with_raw_setting(name, value);
                } else {
                    tracing::debug!(setting = %arg, "Ignoring raw setting without value");
                }
            }
        }
        options
    }

    /// Adds a switch, replacing an earlier one of the same name
    #[must_use]
    pub fn with_switch(mut self, name: &str, value: Option<&str>) -> Self {
        self.switches.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.switches.push((name.to_string(), value.map(str::to_string)));
        self
    }

    /// Adds a raw `name=value` setting
    #[must_use]
    pub fn with_raw_setting(mut self, name: &str, value: &str) -> Self {
        if !self.has_switch(RAW_SETTINGS_SWITCH) {
            self.switches.push((RAW_SETTINGS_SWITCH.to_string(), None));
        }
        self.raw_settings.push((name.to_string(), value.to_string()));
        self
    }

    /// Returns true if no switch was given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// Returns true if the switch was given
    #[must_use]
    pub fn has_switch(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Value of a switch, empty for a bare switch
    #[must_use]
    pub fn find_switch(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|value| value.unwrap_or(""))
    }

    /// Boolean value of a switch, `default` if it was not given.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSwitch` if the value is not a boolean.
    pub fn switch_value(&self, name: &str, default: bool) -> SessionResult<bool> {
        match self.entry(name) {
            None => Ok(default),
            Some(None) => Ok(true),
            Some(Some(value)) if value.is_empty() => Ok(true),
            Some(Some(value)) => parse_bool(value).ok_or_else(|| SessionError::InvalidSwitch {
                switch: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Settings given after the raw settings switch
    #[must_use]
    pub fn raw_settings(&self) -> &[(String, String)] {
        &self.raw_settings
    }

    fn entry(&self, name: &str) -> Option<Option<&str>> {
        self.switches
            .iter()
            .rev()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_deref())
    }
}
