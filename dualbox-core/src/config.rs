use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// How deep nested input arrays are unwrapped before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenDepth {
    /// Unwrap every level of array nesting.
    Full,
    /// Unwrap exactly this many extra levels below the outer array.
    ///
    /// The event/session feeds this crate was built for arrive as
    /// `array<array<array<Record>>>`, i.e. `Levels(2)`.
    Levels(usize),
}

impl Default for FlattenDepth {
    fn default() -> Self {
        FlattenDepth::Full
    }
}

/// Case policy for property names, applied uniformly to records, schemas,
/// grouping keys and key mappings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    #[default]
    Exact,
    Lowercase,
}

impl KeyCase {
    pub fn apply<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            KeyCase::Exact => Cow::Borrowed(name),
            KeyCase::Lowercase if name.chars().any(char::is_uppercase) => {
                Cow::Owned(name.to_lowercase())
            }
            KeyCase::Lowercase => Cow::Borrowed(name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReshapeConfig {
    /// How far nested input arrays are flattened before grouping
    pub flatten_depth: FlattenDepth,
    /// Explicit grouping keys. If None, the id/name keys are inferred from the schema.
    pub group_by: Option<Vec<String>>,
    /// Property name case policy
    pub key_case: KeyCase,
    /// Enable debug output. When `true`, prints schema validation failures, chosen
    /// grouping keys, and group/merge decisions to stderr.
    pub debug: bool,
    /// Controls the verbosity level of debug output
    pub verbosity: DebugVerbosity,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum DebugVerbosity {
    /// Show validation failures and the shape of the result
    #[default]
    Normal,
    /// Also show every group and leaf as it is created
    Verbose,
}

impl ReshapeConfig {
    pub fn debug(&self, args: std::fmt::Arguments) {
        if self.debug {
            anstream::eprintln!("{}", args);
        }
    }

    pub fn debug_verbose(&self, args: std::fmt::Arguments) {
        if self.debug && matches!(self.verbosity, DebugVerbosity::Verbose) {
            anstream::eprintln!("{}", args);
        }
    }
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            flatten_depth: FlattenDepth::default(),
            group_by: None,
            key_case: KeyCase::default(),
            debug: false,
            verbosity: DebugVerbosity::default(),
        }
    }
}

#[macro_export]
macro_rules! debug {
    ($cfg:expr, $($arg:tt)*) => {
        $cfg.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_verbose {
    ($cfg:expr, $($arg:tt)*) => {
        $cfg.debug_verbose(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_case_folding() {
        assert_eq!(KeyCase::Exact.apply("HasMeetingURL"), "HasMeetingURL");
        assert_eq!(KeyCase::Lowercase.apply("HasMeetingURL"), "hasmeetingurl");
        assert!(matches!(KeyCase::Lowercase.apply("idevent"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = ReshapeConfig {
            flatten_depth: FlattenDepth::Levels(2),
            group_by: Some(vec!["idevent".into()]),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["flatten_depth"], serde_json::json!({"levels": 2}));
        let back: ReshapeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.flatten_depth, FlattenDepth::Levels(2));
    }
}
