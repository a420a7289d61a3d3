//! Key-path resolution against a snapshot.

use crate::json_path;
use crate::key_path::KeyPath;
use crate::snapshot::ConfigSnapshot;
use crate::system::KEY_SECTION;
use serde_json::Value;

/// A value found by [`lookup`], borrowed from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedValue<'a> {
    /// INI option (always a string).
    System(&'a str),
    /// Node of the user document.
    User(&'a Value),
}

impl ResolvedValue<'_> {
    /// Owned JSON form. INI options become JSON strings.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::System(text) => Value::String(text.to_owned()),
            Self::User(value) => value.clone(),
        }
    }
}

/// Find the value addressed by `key_path`, if any.
#[must_use]
pub fn lookup<'a>(snapshot: &'a ConfigSnapshot, key_path: &str) -> Option<ResolvedValue<'a>> {
    match KeyPath::parse(key_path) {
        KeyPath::Bare(name) => snapshot
            .system
            .lookup_flat(name)
            .map(ResolvedValue::System)
            .or_else(|| json_path::lookup(&snapshot.user, &[name]).map(ResolvedValue::User)),
        KeyPath::System(option) => snapshot
            .system
            .lookup_flat(option)
            .or_else(|| snapshot.system.get(KEY_SECTION, option))
            .map(ResolvedValue::System),
        KeyPath::Config(segments) => {
            json_path::lookup(&snapshot.user, &segments).map(ResolvedValue::User)
        },
        KeyPath::Unrecognized { .. } => None,
    }
}

/// Resolve `key_path`, returning `default` when nothing is found.
#[must_use]
pub fn resolve(snapshot: &ConfigSnapshot, key_path: &str, default: Value) -> Value {
    lookup(snapshot, key_path).map_or(default, ResolvedValue::to_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> ConfigSnapshot {
        let mut snapshot = ConfigSnapshot::empty(None);
        snapshot.system.set("key", "tts_module", "azure");
        snapshot.system.set("key", "local_asr_port", "10197");
        snapshot.user = json!({"attribute": {"name": "Fei"}, "interact": 1});
        snapshot
    }

    #[test]
    fn bare_keys_prefer_the_system_view() {
        let snapshot = snapshot();
        assert_eq!(resolve(&snapshot, "tts_module", Value::Null), json!("azure"));
        assert_eq!(resolve(&snapshot, "key_tts_module", Value::Null), json!("azure"));
        assert_eq!(resolve(&snapshot, "interact", Value::Null), json!(1));
        assert_eq!(resolve(&snapshot, "missing", json!("d")), json!("d"));
    }

    #[test]
    fn system_values_stay_strings() {
        let snapshot = snapshot();
        assert_eq!(
            resolve(&snapshot, "system.local_asr_port", Value::Null),
            json!("10197")
        );
    }

    #[test]
    fn config_paths_never_fail() {
        let snapshot = snapshot();
        assert_eq!(
            resolve(&snapshot, "config.attribute.name", Value::Null),
            json!("Fei")
        );
        assert_eq!(
            resolve(&snapshot, "config.interact.deeper", json!(0)),
            json!(0)
        );
        assert_eq!(resolve(&snapshot, "config.nope.x", json!(0)), json!(0));
        assert_eq!(resolve(&snapshot, "bogus.tts_module", json!(0)), json!(0));
    }

    #[test]
    fn lookup_reports_the_source() {
        let snapshot = snapshot();
        assert_eq!(
            lookup(&snapshot, "system.tts_module"),
            Some(ResolvedValue::System("azure"))
        );
        assert!(matches!(
            lookup(&snapshot, "config.attribute"),
            Some(ResolvedValue::User(_))
        ));
    }
}
