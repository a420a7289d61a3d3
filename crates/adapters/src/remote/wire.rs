//! Wire format of the remote configuration service.

use confhub_domain::{ConfigSnapshot, KEY_SECTION, ProjectId, ProjectMetadata, Sections, SystemConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response envelope of `GET /api/projects/{id}/config`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchResponse {
    /// True when `project` is meaningful.
    pub success: bool,
    /// Project payload.
    pub project: Option<ProjectPayload>,
    /// Failure message when `success` is false.
    pub message: Option<String>,
}

/// Project configuration as exchanged with the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPayload {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// INI-shaped mapping: section -> option -> scalar.
    pub system_config: IndexMap<String, IndexMap<String, Value>>,
    /// Arbitrary user JSON tree.
    pub config_json: Value,
}

impl ProjectPayload {
    /// Wire view of a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        let system_config = snapshot
            .system
            .sections()
            .iter()
            .map(|(section, options)| {
                let options = options
                    .iter()
                    .map(|(option, value)| (option.clone(), Value::String(value.clone())))
                    .collect();
                (section.clone(), options)
            })
            .collect();
        Self {
            name: snapshot.metadata.name.to_string(),
            description: snapshot.metadata.description.to_string(),
            system_config,
            config_json: snapshot.user.clone(),
        }
    }

    /// Translate into a remote-origin snapshot.
    ///
    /// Every scalar is stringified and section `key` always exists, listed first.
    #[must_use]
    pub fn into_snapshot(self, project_id: ProjectId) -> ConfigSnapshot {
        let mut sections = Sections::new();
        sections.insert(KEY_SECTION.to_string(), IndexMap::new());
        for (section, options) in self.system_config {
            let target = sections.entry(section).or_default();
            for (option, value) in options {
                target.insert(option, stringify(value));
            }
        }

        let user = match self.config_json {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let metadata = ProjectMetadata {
            name: self.name.into_boxed_str(),
            description: self.description.into_boxed_str(),
        };
        ConfigSnapshot::remote(project_id, SystemConfig::from_sections(sections), user, metadata)
    }
}

/// String form of a remote scalar as stored in the INI view.
#[must_use]
pub fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
    }
}
