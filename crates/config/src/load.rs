//! Settings loading helpers (file + env).
//!
//! The loader owns the merge order and surfaces user-facing failures as
//! typed `ErrorEnvelope`s.

use crate::{EngineEnv, EngineSettings, ValidatedEngineSettings, apply_env_overrides};
use confhub_shared::{ErrorClass, ErrorCode, ErrorEnvelope, REDACTED};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsFormat {
    Json,
    Toml,
}

/// Load engine settings from an optional file path.
///
/// Precedence (highest wins):
/// - env overrides (`EngineEnv`)
/// - settings file (JSON or TOML, by extension)
/// - defaults (`EngineSettings::default()`)
pub fn load_engine_settings_from_path(
    settings_path: Option<&Path>,
    env: &EngineEnv,
) -> Result<ValidatedEngineSettings, ErrorEnvelope> {
    let settings = match settings_path {
        None => EngineSettings::default(),
        Some(path) => {
            let format = detect_settings_format(path)?;
            let text = read_settings_file(path)?;
            parse_settings_unvalidated(&text, format)
                .map_err(|error| error.with_metadata("path", path.to_string_lossy().to_string()))?
        },
    };

    // env goes last and also validates the merged settings.
    apply_env_overrides(settings, env)
}

/// Load engine settings from an optional file path and the process env.
pub fn load_engine_settings_std_env(
    settings_path: Option<&Path>,
) -> Result<ValidatedEngineSettings, ErrorEnvelope> {
    let env = EngineEnv::from_std_env()?;
    load_engine_settings_from_path(settings_path, &env)
}

/// Serialize the settings as pretty JSON (trailing newline, API key redacted).
pub fn to_pretty_json(settings: &EngineSettings) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(&redacted(settings)).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("core", "internal"),
            format!("failed to serialize settings: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the settings as pretty TOML (trailing newline, API key redacted).
pub fn to_pretty_toml(settings: &EngineSettings) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(&redacted(settings)).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize settings TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn redacted(settings: &EngineSettings) -> EngineSettings {
    let mut copy = settings.clone();
    if copy.remote.api_key.is_some() {
        copy.remote.api_key = Some(REDACTED.into());
    }
    copy
}

fn parse_settings_unvalidated(
    input: &str,
    format: SettingsFormat,
) -> Result<EngineSettings, ErrorEnvelope> {
    match format {
        SettingsFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid settings JSON: {error}"),
            )
        }),
        SettingsFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid settings TOML: {error}"),
            )
        }),
    }
}

fn read_settings_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "settings_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "settings_file_permission_denied")
            },
            _ => ErrorCode::new("config", "settings_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read settings file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_settings_format(path: &Path) -> Result<SettingsFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(SettingsFormat::Json),
        Some("toml") => Ok(SettingsFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported settings format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}
