//! Pure mutations over a snapshot. Persistence lives in the application layer.

use crate::error::ConfigError;
use crate::json_path;
use crate::key_path::MutationTarget;
use crate::snapshot::ConfigSnapshot;
use crate::system::qualified_name;
use crate::value::coerce_value;
use serde_json::Value;
use std::collections::BTreeMap;

/// Which side of the snapshot a mutation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Touched {
    /// The INI side (`system.conf`).
    System,
    /// The JSON side (`config.json`).
    User,
}

/// Apply `key_path = raw` to the snapshot.
///
/// System writes store `raw` verbatim; config writes store the coerced value.
pub fn apply_set(
    snapshot: &mut ConfigSnapshot,
    key_path: &str,
    raw: &str,
) -> Result<Touched, ConfigError> {
    match MutationTarget::parse(key_path)? {
        MutationTarget::System { section, option } => {
            snapshot.system.set(&section, &option, raw);
            Ok(Touched::System)
        },
        MutationTarget::Config(segments) => {
            let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
            json_path::set_path(&mut snapshot.user, &segments, coerce_value(raw));
            Ok(Touched::User)
        },
    }
}

/// Remove the value addressed by `key_path`.
pub fn apply_delete(snapshot: &mut ConfigSnapshot, key_path: &str) -> Result<Touched, ConfigError> {
    match MutationTarget::parse(key_path)? {
        MutationTarget::System { section, option } => snapshot
            .system
            .remove(&section, &option)
            .map(|_| Touched::System)
            .ok_or_else(|| ConfigError::not_found(key_path)),
        MutationTarget::Config(segments) => {
            let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
            json_path::remove_path(&mut snapshot.user, &segments)
                .map(|_| Touched::User)
                .ok_or_else(|| ConfigError::not_found(key_path))
        },
    }
}

/// Update existing options from form fields named `section_option`.
///
/// Fields that do not name an existing option are ignored. Returns the
/// qualified names that changed value.
pub fn apply_form_fields(
    snapshot: &mut ConfigSnapshot,
    fields: &BTreeMap<String, String>,
) -> Vec<String> {
    let updates: Vec<(String, String, String)> = snapshot
        .system
        .options()
        .filter_map(|(section, option, current)| {
            let name = qualified_name(section, option);
            let value = fields.get(&name)?;
            (value != current).then(|| (section.to_owned(), option.to_owned(), value.clone()))
        })
        .collect();

    updates
        .into_iter()
        .map(|(section, option, value)| {
            snapshot.system.set(&section, &option, value);
            qualified_name(&section, &option)
        })
        .collect()
}

/// Replace the whole user document.
pub fn replace_user(snapshot: &mut ConfigSnapshot, document: Value) -> Value {
    std::mem::replace(&mut snapshot.user, document)
}
