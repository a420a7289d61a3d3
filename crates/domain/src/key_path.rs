//! Dotted key paths.
//!
//! Read form (`KeyPath`):
//! - `name`: flattened system view, then the root of the user document.
//! - `system.<option>`: flattened system view, then section `key`.
//! - `config.<a>.<b>...`: nested user document.
//! - `<other>.<rest>`: unrecognized, always resolves to the default.
//!
//! Write form (`MutationTarget`) is stricter: `system.<section>.<option>` or
//! `config.<path>` with non-empty segments. System section and option names
//! must survive an INI rewrite unchanged; see [`UnsupportedReason::IniName`].

use std::fmt;
use thiserror::Error;

/// Source prefix for the INI side.
pub const SYSTEM_PREFIX: &str = "system";
/// Source prefix for the JSON side.
pub const CONFIG_PREFIX: &str = "config";

/// A parsed read path. Borrows from the input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPath<'a> {
    /// No dot present.
    Bare(&'a str),
    /// `system.<rest>`; `rest` is looked up as a single option name.
    System(&'a str),
    /// `config.<segments>`.
    Config(Vec<&'a str>),
    /// Dotted path with an unknown prefix.
    Unrecognized {
        /// Text before the first dot.
        prefix: &'a str,
    },
}

impl<'a> KeyPath<'a> {
    /// Parse a read path. Never fails.
    #[must_use]
    pub fn parse(key_path: &'a str) -> Self {
        match key_path.split_once('.') {
            None => Self::Bare(key_path),
            Some((SYSTEM_PREFIX, rest)) => Self::System(rest),
            Some((CONFIG_PREFIX, rest)) => Self::Config(rest.split('.').collect()),
            Some((prefix, _)) => Self::Unrecognized { prefix },
        }
    }
}

/// Why a write path was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// No `.` in the path.
    MissingSource,
    /// Prefix other than `system` or `config`.
    UnknownSource,
    /// `system.` paths need exactly a section and an option.
    SystemSegments,
    /// A segment is empty (`config..a`, `config.`).
    EmptySegment,
    /// A system section or option name that `system.conf` cannot hold: a
    /// section with `[`, `]` or a line break, an option with `=`, `:` or a
    /// line break, an option starting with `#` or `;`, or either one with
    /// surrounding whitespace.
    IniName,
}

impl UnsupportedReason {
    /// Stable identifier for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSource => "missing_source",
            Self::UnknownSource => "unknown_source",
            Self::SystemSegments => "system_segments",
            Self::EmptySegment => "empty_segment",
            Self::IniName => "ini_name",
        }
    }
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingSource => "expected `system.<section>.<option>` or `config.<path>`",
            Self::UnknownSource => "source must be `system` or `config`",
            Self::SystemSegments => "system writes need exactly `system.<section>.<option>`",
            Self::EmptySegment => "path segments must be non-empty",
            Self::IniName => "section or option name cannot be written to system.conf",
        };
        formatter.write_str(text)
    }
}

/// A write path rejected before touching any snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported key path `{key_path}`: {reason}")]
pub struct UnsupportedKeyPath {
    /// Offending path as supplied.
    pub key_path: String,
    /// Rejection reason.
    pub reason: UnsupportedReason,
}

/// A validated write path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationTarget {
    /// One INI option.
    System {
        /// Section name (case-sensitive).
        section: String,
        /// Option name.
        option: String,
    },
    /// A path into the user document.
    Config(Vec<String>),
}

impl MutationTarget {
    /// Parse a write path.
    pub fn parse(key_path: &str) -> Result<Self, UnsupportedKeyPath> {
        let reject = |reason| UnsupportedKeyPath {
            key_path: key_path.to_owned(),
            reason,
        };
        let Some((source, rest)) = key_path.split_once('.') else {
            return Err(reject(UnsupportedReason::MissingSource));
        };
        let segments: Vec<&str> = rest.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(reject(UnsupportedReason::EmptySegment));
        }
        match source {
            SYSTEM_PREFIX => match segments.as_slice() {
                [section, option]
                    if !is_ini_section_name(section) || !is_ini_option_name(option) =>
                {
                    Err(reject(UnsupportedReason::IniName))
                },
                [section, option] => Ok(Self::System {
                    section: (*section).to_owned(),
                    option: (*option).to_owned(),
                }),
                _ => Err(reject(UnsupportedReason::SystemSegments)),
            },
            CONFIG_PREFIX => Ok(Self::Config(
                segments.into_iter().map(str::to_owned).collect(),
            )),
            _ => Err(reject(UnsupportedReason::UnknownSource)),
        }
    }

    /// Borrowed segments of a `Config` target.
    #[must_use]
    pub fn config_segments(&self) -> Option<Vec<&str>> {
        match self {
            Self::Config(segments) => Some(segments.iter().map(String::as_str).collect()),
            Self::System { .. } => None,
        }
    }
}

fn has_edge_whitespace(name: &str) -> bool {
    name.trim() != name
}

fn is_ini_section_name(name: &str) -> bool {
    !has_edge_whitespace(name) && !name.contains(['[', ']', '\n', '\r'])
}

fn is_ini_option_name(name: &str) -> bool {
    !has_edge_whitespace(name)
        && !name.contains(['=', ':', '\n', '\r'])
        && !name.starts_with(['#', ';', '['])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_paths_split_on_the_first_dot() {
        assert_eq!(KeyPath::parse("tts_module"), KeyPath::Bare("tts_module"));
        assert_eq!(KeyPath::parse("system.a.b"), KeyPath::System("a.b"));
        assert_eq!(
            KeyPath::parse("config.attribute.name"),
            KeyPath::Config(vec!["attribute", "name"])
        );
        assert_eq!(
            KeyPath::parse("bogus.a"),
            KeyPath::Unrecognized { prefix: "bogus" }
        );
    }

    #[test]
    fn write_paths_are_validated() {
        assert_eq!(
            MutationTarget::parse("system.key.gpt_api_key"),
            Ok(MutationTarget::System {
                section: "key".to_owned(),
                option: "gpt_api_key".to_owned(),
            })
        );
        assert_eq!(
            MutationTarget::parse("config.a.b"),
            Ok(MutationTarget::Config(vec!["a".to_owned(), "b".to_owned()]))
        );

        let reason = |path: &str| MutationTarget::parse(path).map_err(|error| error.reason);
        assert_eq!(reason("bogus.a.b"), Err(UnsupportedReason::UnknownSource));
        assert_eq!(reason("tts_module"), Err(UnsupportedReason::MissingSource));
        assert_eq!(reason("system.key"), Err(UnsupportedReason::SystemSegments));
        assert_eq!(
            reason("system.a.b.c"),
            Err(UnsupportedReason::SystemSegments)
        );
        assert_eq!(reason("config."), Err(UnsupportedReason::EmptySegment));
        assert_eq!(reason("config.a..b"), Err(UnsupportedReason::EmptySegment));
    }

    #[test]
    fn system_names_must_fit_the_ini_syntax() {
        let reason = |path: &str| MutationTarget::parse(path).map_err(|error| error.reason);
        for path in [
            "system.key.proxy:http",
            "system.key.a=b",
            "system.key.#note",
            "system.key.;note",
            "system.key.[x",
            "system.key. padded",
            "system.key.line\nbreak",
            "system.a]b.option",
            "system.[a.option",
            "system. key.option",
        ] {
            assert_eq!(reason(path), Err(UnsupportedReason::IniName), "{path}");
        }
        assert!(MutationTarget::parse("system.Key Section.option_name-1").is_ok());
        assert!(MutationTarget::parse("config.a:b.c=d").is_ok());
    }
}
