//! Settings loading helpers for CLI surfaces.

use crate::InfraResult;
use confhub_config::{
    EngineEnv, ValidatedEngineSettings, engine_settings_schema, load_engine_settings_from_path,
    to_pretty_json, to_pretty_toml,
};
use confhub_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::path::Path;

/// Output format of the effective settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsFormat {
    /// Pretty JSON.
    #[default]
    Json,
    /// Pretty TOML.
    Toml,
}

/// Load and validate settings from a file plus the process environment.
pub fn load_settings(settings_path: Option<&Path>) -> InfraResult<ValidatedEngineSettings> {
    let env = EngineEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_engine_settings_from_path(settings_path, &env)
}

/// Load and validate settings from a file plus explicit env variables.
pub fn load_settings_with_env(
    env: &BTreeMap<String, String>,
    settings_path: Option<&Path>,
) -> InfraResult<ValidatedEngineSettings> {
    let env = EngineEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_engine_settings_from_path(settings_path, &env)
}

/// Effective settings, rendered deterministically with the API key redacted.
pub fn load_effective_settings(
    env: &BTreeMap<String, String>,
    settings_path: Option<&Path>,
    format: SettingsFormat,
) -> InfraResult<String> {
    let settings = load_settings_with_env(env, settings_path)?;
    match format {
        SettingsFormat::Json => to_pretty_json(&settings),
        SettingsFormat::Toml => to_pretty_toml(&settings),
    }
}

/// JSON Schema of the settings file.
pub fn settings_schema_json() -> InfraResult<String> {
    let mut output = serde_json::to_string_pretty(&engine_settings_schema()).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize settings schema: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}
