//! Engine settings commands.

use crate::CliOutput;
use crate::error::CliError;
use crate::format::{OutputMode, format_error_output, ok_output};
use confhub_infra::{SettingsFormat, load_effective_settings, settings_schema_json};
use std::collections::BTreeMap;
use std::path::Path;

const ENV_PREFIX: &str = "CONFHUB_";

/// Print the effective settings (file, then env overrides).
pub fn run_settings_show(
    mode: OutputMode,
    path: Option<&Path>,
    toml: bool,
) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env(ENV_PREFIX);
    let format = if toml && !(mode.is_json() || mode.is_ndjson()) {
        SettingsFormat::Toml
    } else {
        SettingsFormat::Json
    };
    let rendered = match load_effective_settings(&env, path, format) {
        Ok(rendered) => rendered,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let payload = if matches!(format, SettingsFormat::Json) {
        let settings: serde_json::Value = serde_json::from_str(rendered.trim())?;
        serde_json::json!({
            "settingsPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveSettings": settings,
        })
    } else {
        serde_json::Value::Null
    };
    ok_output(mode, payload, || rendered, "")
}

/// Print the JSON Schema of the settings file.
pub fn run_settings_schema(mode: OutputMode) -> Result<CliOutput, CliError> {
    let schema = match settings_schema_json() {
        Ok(schema) => schema,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let payload: serde_json::Value = serde_json::from_str(schema.trim())?;
    ok_output(mode, serde_json::json!({ "schema": payload }), || schema, "")
}

fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}
