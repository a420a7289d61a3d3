//! INI-shaped system configuration and its flattened lookup view.
//!
//! Section names are case-sensitive; option names are stored lower-cased.
//! The flattened view answers two name forms:
//!
//! - `section_option`: exactly that option.
//! - `option`: the value most recently written for that option name in any
//!   section. On load, later sections in file order win.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Section name that holds the well-known options and answers `system.<name>` lookups.
pub const KEY_SECTION: &str = "key";

/// Options of a single section, in file order.
pub type Section = IndexMap<String, String>;

/// Sections in file order.
pub type Sections = IndexMap<String, Section>;

/// System configuration: ordered sections of string options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Sections", into = "Sections")]
pub struct SystemConfig {
    sections: Sections,
    qualified: HashMap<String, String>,
    bare: HashMap<String, String>,
}

impl SystemConfig {
    /// Create an empty system configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed sections. Option names are lower-cased.
    #[must_use]
    pub fn from_sections(sections: Sections) -> Self {
        let sections = sections
            .into_iter()
            .map(|(name, options)| {
                let options = options
                    .into_iter()
                    .map(|(option, value)| (normalize_option(&option), value))
                    .collect();
                (name, options)
            })
            .collect();
        let mut config = Self {
            sections,
            qualified: HashMap::new(),
            bare: HashMap::new(),
        };
        config.rebuild_flat_view();
        config
    }

    /// Borrow the sections in file order.
    #[must_use]
    pub const fn sections(&self) -> &Sections {
        &self.sections
    }

    /// Borrow a single section.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Returns true when no section exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Ensure a section exists, creating it empty when missing.
    pub fn ensure_section(&mut self, name: &str) {
        if !self.sections.contains_key(name) {
            self.sections.insert(name.to_owned(), Section::new());
        }
    }

    /// Read one option.
    #[must_use]
    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .get(&normalize_option(option))
            .map(String::as_str)
    }

    /// Write one option, creating the section when needed.
    ///
    /// Returns the previous value of that exact option.
    pub fn set(
        &mut self,
        section: &str,
        option: &str,
        value: impl Into<String>,
    ) -> Option<String> {
        let option = normalize_option(option);
        let value = value.into();
        self.ensure_section(section);
        let previous = self
            .sections
            .get_mut(section)
            .and_then(|options| options.insert(option.clone(), value.clone()));
        self.qualified
            .insert(qualified_name(section, &option), value.clone());
        self.bare.insert(option, value);
        previous
    }

    /// Remove one option. The section itself is kept even when it becomes empty.
    pub fn remove(&mut self, section: &str, option: &str) -> Option<String> {
        let option = normalize_option(option);
        let removed = self.sections.get_mut(section)?.shift_remove(&option)?;
        self.rebuild_flat_view();
        Some(removed)
    }

    /// Look a name up in the flattened view: qualified name first, then bare name.
    #[must_use]
    pub fn lookup_flat(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.qualified.get(name) {
            return Some(value);
        }
        self.bare.get(&normalize_option(name)).map(String::as_str)
    }

    /// Iterate `(section, option, value)` triples in file order.
    pub fn options(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.sections.iter().flat_map(|(section, options)| {
            options
                .iter()
                .map(move |(option, value)| (section.as_str(), option.as_str(), value.as_str()))
        })
    }

    fn rebuild_flat_view(&mut self) {
        self.qualified.clear();
        self.bare.clear();
        for (section, options) in &self.sections {
            for (option, value) in options {
                self.qualified
                    .insert(qualified_name(section, option), value.clone());
                self.bare.insert(option.clone(), value.clone());
            }
        }
    }
}

impl PartialEq for SystemConfig {
    fn eq(&self, other: &Self) -> bool {
        self.sections == other.sections
    }
}

impl Eq for SystemConfig {}

impl From<Sections> for SystemConfig {
    fn from(sections: Sections) -> Self {
        Self::from_sections(sections)
    }
}

impl From<SystemConfig> for Sections {
    fn from(config: SystemConfig) -> Self {
        config.sections
    }
}

/// Flattened name for an option: `section_option`.
#[must_use]
pub fn qualified_name(section: &str, option: &str) -> String {
    format!("{section}_{option}")
}

pub(crate) fn normalize_option(option: &str) -> String {
    option.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_names_are_case_insensitive() {
        let mut config = SystemConfig::new();
        config.set(KEY_SECTION, "ASR_mode", "funasr");
        assert_eq!(config.get(KEY_SECTION, "asr_mode"), Some("funasr"));
        assert_eq!(config.lookup_flat("ASR_MODE"), Some("funasr"));
        assert_eq!(config.lookup_flat("key_asr_mode"), Some("funasr"));
    }

    #[test]
    fn bare_names_follow_the_most_recent_write() {
        let mut config = SystemConfig::new();
        config.set("key", "port", "10197");
        config.set("proxy", "port", "7890");
        assert_eq!(config.lookup_flat("port"), Some("7890"));

        config.set("key", "port", "10198");
        assert_eq!(config.lookup_flat("port"), Some("10198"));
        assert_eq!(config.lookup_flat("proxy_port"), Some("7890"));
    }

    #[test]
    fn later_sections_win_on_load() {
        let mut sections = Sections::new();
        sections.insert(
            "first".to_owned(),
            Section::from([("mode".to_owned(), "a".to_owned())]),
        );
        sections.insert(
            "second".to_owned(),
            Section::from([("mode".to_owned(), "b".to_owned())]),
        );
        let config = SystemConfig::from_sections(sections);
        assert_eq!(config.lookup_flat("mode"), Some("b"));
    }

    #[test]
    fn remove_falls_back_to_remaining_sections() {
        let mut config = SystemConfig::new();
        config.set("first", "mode", "a");
        config.set("second", "mode", "b");

        assert_eq!(config.remove("second", "mode"), Some("b".to_owned()));
        assert_eq!(config.lookup_flat("mode"), Some("a"));
        assert_eq!(config.lookup_flat("second_mode"), None);
        assert!(config.section("second").is_some());
        assert_eq!(config.remove("second", "mode"), None);
    }

    #[test]
    fn equality_ignores_write_history() {
        let mut left = SystemConfig::new();
        left.set("a", "x", "1");
        left.set("b", "x", "2");
        left.set("a", "x", "1");

        let mut right = SystemConfig::new();
        right.set("a", "x", "1");
        right.set("b", "x", "2");

        assert_eq!(left, right);
    }

    #[test]
    fn serializes_as_plain_sections() -> Result<(), serde_json::Error> {
        let mut config = SystemConfig::new();
        config.set("key", "tts_module", "azure");
        let json = serde_json::to_value(&config)?;
        assert_eq!(json, serde_json::json!({"key": {"tts_module": "azure"}}));

        let back: SystemConfig = serde_json::from_value(json)?;
        assert_eq!(back.lookup_flat("tts_module"), Some("azure"));
        Ok(())
    }
}
