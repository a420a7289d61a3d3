//! In-memory configuration snapshot for one project.

use crate::project::{ProjectId, ProjectMetadata};
use crate::system::SystemConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provenance of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Parsed from `system.conf` and `config.json`.
    Local,
    /// Fetched from the remote configuration service.
    Remote,
}

impl Origin {
    /// Lower-case label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// One project's resolved configuration.
///
/// Equality ignores `loaded_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    /// Project id; `None` for the global snapshot.
    pub project_id: Option<ProjectId>,
    /// INI side.
    pub system: SystemConfig,
    /// JSON side.
    pub user: Value,
    /// Where the snapshot came from.
    pub origin: Origin,
    /// Project metadata (empty for local loads).
    #[serde(default)]
    pub metadata: ProjectMetadata,
    /// Informational load timestamp.
    pub loaded_at: DateTime<Utc>,
}

impl ConfigSnapshot {
    /// Snapshot parsed from local files.
    #[must_use]
    pub fn local(project_id: Option<ProjectId>, system: SystemConfig, user: Value) -> Self {
        Self {
            project_id,
            system,
            user,
            origin: Origin::Local,
            metadata: ProjectMetadata::default(),
            loaded_at: Utc::now(),
        }
    }

    /// Snapshot fetched from the remote service.
    #[must_use]
    pub fn remote(
        project_id: ProjectId,
        system: SystemConfig,
        user: Value,
        metadata: ProjectMetadata,
    ) -> Self {
        Self {
            project_id: Some(project_id),
            system,
            user,
            origin: Origin::Remote,
            metadata,
            loaded_at: Utc::now(),
        }
    }

    /// Empty local snapshot with an empty user mapping.
    #[must_use]
    pub fn empty(project_id: Option<ProjectId>) -> Self {
        Self::local(project_id, SystemConfig::new(), Value::Object(Map::new()))
    }

    /// Returns true when the snapshot came from the remote service.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.origin == Origin::Remote
    }
}

impl PartialEq for ConfigSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.project_id == other.project_id
            && self.system == other.system
            && self.user == other.user
            && self.origin == other.origin
            && self.metadata == other.metadata
    }
}

impl Eq for ConfigSnapshot {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_ignores_load_time() {
        let first = ConfigSnapshot::empty(None);
        let mut second = ConfigSnapshot::empty(None);
        second.loaded_at = first.loaded_at + chrono::Duration::seconds(30);
        assert_eq!(first, second);

        second.origin = Origin::Remote;
        assert_ne!(first, second);
    }

    #[test]
    fn serializes_with_camel_case_fields() -> Result<(), serde_json::Error> {
        let mut snapshot = ConfigSnapshot::empty(ProjectId::parse("alpha").ok());
        snapshot.system.set("key", "tts_module", "azure");
        let value = serde_json::to_value(&snapshot)?;
        assert_eq!(value["projectId"], json!("alpha"));
        assert_eq!(value["origin"], json!("local"));
        assert_eq!(value["system"]["key"]["tts_module"], json!("azure"));
        assert!(value.get("loadedAt").is_some());
        Ok(())
    }
}
