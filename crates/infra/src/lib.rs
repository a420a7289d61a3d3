//! # confhub-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Local CLI orchestration helpers.
pub mod cli_local;
/// Engine assembly from settings.
pub mod engine_factory;
/// Logger and access-log selection.
pub mod observability;
/// Settings loading helpers used by CLI surfaces.
pub mod settings;

use confhub_shared::ErrorEnvelope;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

pub use cli_local::{
    LocalTarget, MutationReport, ProjectView, run_async_with_ctx, run_delete_local,
    run_form_local, run_get_local, run_materialize_local, run_replace_config_local,
    run_set_local, run_show_local,
};
pub use engine_factory::{build_engine, build_remote_port, engine_options};
pub use observability::{
    ACCESS_LOG_ENV, LOG_FORMAT_ENV, LOG_LEVEL_ENV, Observability, observability_from_env,
    observability_from_vars, scope_logger,
};
pub use settings::{
    SettingsFormat, load_effective_settings, load_settings, load_settings_with_env,
    settings_schema_json,
};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
