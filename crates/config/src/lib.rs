//! # confhub-config
//!
//! Settings schema, validation, and normalization for the configuration
//! engine itself (remote service, file layout, backups).
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Settings loading helpers (file + env).
pub mod load;
/// Settings schema types and helpers.
pub mod schema;

pub use schema::{
    CURRENT_SETTINGS_VERSION, DEFAULT_REMOTE_TIMEOUT_MS, EngineSettings, RemoteSettings,
    SettingsError, StorageSettings, ValidatedEngineSettings, engine_settings_schema,
    parse_engine_settings_json, parse_engine_settings_toml,
};

pub use env::{
    ENV_BACKUPS, ENV_DEFAULT_DIR, ENV_PROJECT_ID, ENV_REMOTE_API_KEY, ENV_REMOTE_BASE_URL,
    ENV_REMOTE_ENABLED, ENV_REMOTE_TIMEOUT_MS, EngineEnv, EnvParseError, apply_env_overrides,
};
pub use load::{
    load_engine_settings_from_path, load_engine_settings_std_env, to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
