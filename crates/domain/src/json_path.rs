//! Dotted navigation over the JSON user configuration.
//!
//! Reads never fail: a missing segment or a scalar in the way yields `None`.
//! Writes create intermediate mappings, replacing any non-mapping node found
//! on the way.

use serde_json::{Map, Value};

/// Borrow the node addressed by `segments`.
#[must_use]
pub fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(*segment))
}

/// Returns true when every segment of `segments` exists as a mapping key.
#[must_use]
pub fn contains(root: &Value, segments: &[&str]) -> bool {
    lookup(root, segments).is_some()
}

/// Write `value` at `segments`, creating intermediate mappings.
///
/// An empty path replaces the whole document. Returns the previous terminal value.
pub fn set_path(root: &mut Value, segments: &[&str], value: Value) -> Option<Value> {
    let Some((terminal, parents)) = segments.split_last() else {
        return Some(std::mem::replace(root, value));
    };

    let mut node = root;
    for segment in parents {
        node = ensure_object(node)?
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node)?.insert((*terminal).to_owned(), value)
}

/// Remove the terminal key addressed by `segments`.
///
/// Returns `None` when the key or any intermediate segment is absent.
pub fn remove_path(root: &mut Value, segments: &[&str]) -> Option<Value> {
    let (terminal, parents) = segments.split_last()?;
    let mut node = root;
    for segment in parents {
        node = node.as_object_mut()?.get_mut(*segment)?;
    }
    node.as_object_mut()?.remove(*terminal)
}

/// Recursively rebuild mappings with keys in sorted order.
#[must_use]
pub fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|left, right| left.0.cmp(right.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted(value)))
                    .collect(),
            )
        },
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn ensure_object(node: &mut Value) -> Option<&mut Map<String, Value>> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
}
