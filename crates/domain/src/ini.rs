//! INI codec for `system.conf`.
//!
//! Accepted syntax:
//! - `[section]` headers; section names are case-sensitive.
//! - `option = value` or `option: value`; option names are lower-cased.
//! - Lines starting with `#` or `;` are comments.
//! - Indented lines continue the previous value, joined with `\n`. Blank
//!   lines between continuation lines are kept inside the value; trailing
//!   blank lines are not.
//!
//! Duplicate sections and duplicate options within one section are rejected.

use crate::system::{Section, Sections, SystemConfig, normalize_option};
use thiserror::Error;

/// INI parse failures. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IniParseError {
    /// An option line appeared before any `[section]` header.
    #[error("line {line}: option outside of any section")]
    MissingSectionHeader {
        /// Offending line.
        line: usize,
    },
    /// A non-comment line has neither `=` nor `:`.
    #[error("line {line}: expected `option = value`")]
    MissingDelimiter {
        /// Offending line.
        line: usize,
    },
    /// The option name is empty.
    #[error("line {line}: empty option name")]
    EmptyOptionName {
        /// Offending line.
        line: usize,
    },
    /// A section header appeared twice.
    #[error("line {line}: duplicate section `{section}`")]
    DuplicateSection {
        /// Offending line.
        line: usize,
        /// Section name.
        section: String,
    },
    /// An option appeared twice in one section.
    #[error("line {line}: duplicate option `{option}` in section `{section}`")]
    DuplicateOption {
        /// Offending line.
        line: usize,
        /// Section name.
        section: String,
        /// Option name (lower-cased).
        option: String,
    },
}

impl IniParseError {
    /// 1-based line number of the failure.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::MissingSectionHeader { line }
            | Self::MissingDelimiter { line }
            | Self::EmptyOptionName { line }
            | Self::DuplicateSection { line, .. }
            | Self::DuplicateOption { line, .. } => *line,
        }
    }
}

/// Parse INI text into a [`SystemConfig`].
#[allow(
    unused_assignments,
    reason = "the current_option reset after the continuation branch is always overwritten or followed by a return"
)]
pub fn parse_ini(text: &str) -> Result<SystemConfig, IniParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut sections = Sections::new();
    let mut current_section: Option<String> = None;
    let mut current_option: Option<String> = None;
    let mut pending_blank_lines = 0_usize;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            if current_option.is_some() {
                pending_blank_lines += 1;
            }
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if raw.starts_with([' ', '\t'])
            && let (Some(section), Some(option)) = (&current_section, &current_option)
            && let Some(value) = sections
                .get_mut(section)
                .and_then(|options: &mut Section| options.get_mut(option))
        {
            for _ in 0..=pending_blank_lines {
                value.push('\n');
            }
            value.push_str(trimmed);
            pending_blank_lines = 0;
            continue;
        }
        current_option = None;
        pending_blank_lines = 0;

        if let Some(name) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let name = name.trim().to_owned();
            if sections.contains_key(&name) {
                return Err(IniParseError::DuplicateSection {
                    line,
                    section: name,
                });
            }
            sections.insert(name.clone(), Section::new());
            current_section = Some(name);
            current_option = None;
            continue;
        }

        let Some(section) = current_section.as_ref() else {
            return Err(IniParseError::MissingSectionHeader { line });
        };
        let Some(split_at) = trimmed.find(['=', ':']) else {
            return Err(IniParseError::MissingDelimiter { line });
        };
        let (raw_option, rest) = trimmed.split_at(split_at);
        let option = normalize_option(raw_option);
        if option.is_empty() {
            return Err(IniParseError::EmptyOptionName { line });
        }
        let value = rest.get(1..).unwrap_or_default().trim().to_owned();

        let options = sections.entry(section.clone()).or_default();
        if options.contains_key(&option) {
            return Err(IniParseError::DuplicateOption {
                line,
                section: section.clone(),
                option,
            });
        }
        options.insert(option.clone(), value);
        current_option = Some(option);
    }

    Ok(SystemConfig::from_sections(sections))
}

/// Render a [`SystemConfig`] as INI text.
///
/// Each section is followed by a blank line; multi-line values are written
/// with tab-indented continuation lines.
#[must_use]
pub fn render_ini(config: &SystemConfig) -> String {
    let mut out = String::new();
    for (section, options) in config.sections() {
        out.push('[');
        out.push_str(section);
        out.push_str("]\n");
        for (option, value) in options {
            out.push_str(option);
            out.push_str(" = ");
            out.push_str(&value.replace('\n', "\n\t"));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Fay system configuration
[key]
ASR_mode = ali
local_asr_ip=127.0.0.1
local_asr_port: 10197
; comment
gpt_api_key =

[proxy]
proxy_config = http://127.0.0.1:7890
";

    #[test]
    fn parses_sections_and_delimiters() -> Result<(), IniParseError> {
        let config = parse_ini(SAMPLE)?;
        assert_eq!(config.get("key", "asr_mode"), Some("ali"));
        assert_eq!(config.get("key", "local_asr_ip"), Some("127.0.0.1"));
        assert_eq!(config.get("key", "local_asr_port"), Some("10197"));
        assert_eq!(config.get("key", "gpt_api_key"), Some(""));
        assert_eq!(
            config.get("proxy", "proxy_config"),
            Some("http://127.0.0.1:7890")
        );
        Ok(())
    }

    #[test]
    fn continuation_lines_extend_the_previous_value() -> Result<(), IniParseError> {
        let config = parse_ini("[key]\nprompt = first\n  second\n\tthird\n")?;
        assert_eq!(config.get("key", "prompt"), Some("first\nsecond\nthird"));

        let rendered = render_ini(&config);
        assert_eq!(rendered, "[key]\nprompt = first\n\tsecond\n\tthird\n\n");
        assert_eq!(parse_ini(&rendered)?, config);
        Ok(())
    }

    #[test]
    fn blank_lines_inside_values_survive_a_rewrite() -> Result<(), IniParseError> {
        let mut config = parse_ini("[key]\ntts_module = azure\n")?;
        config.set("key", "prompt", "line1\n\nline3\n\n\nline6");

        let rendered = render_ini(&config);
        let reparsed = parse_ini(&rendered)?;
        assert_eq!(reparsed.get("key", "prompt"), Some("line1\n\nline3\n\n\nline6"));
        assert_eq!(reparsed.get("key", "tts_module"), Some("azure"));
        assert_eq!(reparsed, config);
        Ok(())
    }

    #[test]
    fn trailing_blank_lines_end_the_value() -> Result<(), IniParseError> {
        let config = parse_ini("[key]\nprompt = a\n\n\nnext = b\n")?;
        assert_eq!(config.get("key", "prompt"), Some("a"));
        assert_eq!(config.get("key", "next"), Some("b"));
        Ok(())
    }

    #[test]
    fn reports_structural_errors_with_line_numbers() {
        assert_eq!(
            parse_ini("a = 1\n"),
            Err(IniParseError::MissingSectionHeader { line: 1 })
        );
        assert_eq!(
            parse_ini("[key]\n\njust words\n"),
            Err(IniParseError::MissingDelimiter { line: 3 })
        );
        assert!(matches!(
            parse_ini("[key]\n[key]\n"),
            Err(IniParseError::DuplicateSection { line: 2, .. })
        ));
        assert!(matches!(
            parse_ini("[key]\nA = 1\na = 2\n"),
            Err(IniParseError::DuplicateOption { line: 3, .. })
        ));
        assert_eq!(
            parse_ini("[key]\n = 1\n").map_err(|error| error.line()),
            Err(2)
        );
    }

    #[test]
    fn render_then_parse_is_stable() -> Result<(), IniParseError> {
        let config = parse_ini(SAMPLE)?;
        let rendered = render_ini(&config);
        assert!(rendered.starts_with("[key]\nasr_mode = ali\n"));
        assert_eq!(parse_ini(&rendered)?, config);
        Ok(())
    }

    #[test]
    fn empty_input_yields_empty_config() -> Result<(), IniParseError> {
        assert!(parse_ini("")?.is_empty());
        assert!(parse_ini("\u{feff}# only comments\n")?.is_empty());
        Ok(())
    }
}
