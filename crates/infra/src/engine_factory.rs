//! Engine assembly from validated settings.

use crate::InfraResult;
use crate::observability::Observability;
use confhub_adapters::{
    DisabledRemoteConfig, HttpRemoteConfig, HttpRemoteConfigOptions, LocalConfigStore,
};
use confhub_app::{ConfigEngine, EngineDeps, EngineOptions};
use confhub_config::ValidatedEngineSettings;
use confhub_ports::RemoteConfigPort;
use std::sync::Arc;

/// Engine options derived from settings.
#[must_use]
pub fn engine_options(settings: &ValidatedEngineSettings) -> EngineOptions {
    EngineOptions {
        default_dir: settings.default_dir(),
        system_file_name: settings.storage.system_file_name.clone(),
        user_file_name: settings.storage.user_file_name.clone(),
        default_project_id: settings.default_project_id().cloned(),
        backups: settings.storage.backups,
    }
}

/// Remote port for the settings: HTTP when a base URL is set, disabled otherwise.
pub fn build_remote_port(
    settings: &ValidatedEngineSettings,
) -> InfraResult<Arc<dyn RemoteConfigPort>> {
    let Some(base_url) = settings.remote_base_url() else {
        tracing::debug!(target: "confhub::infra", "remote configuration disabled");
        return Ok(Arc::new(DisabledRemoteConfig));
    };
    let remote = HttpRemoteConfig::new(HttpRemoteConfigOptions {
        base_url: base_url.into(),
        api_key: settings.api_key().cloned(),
        timeout: settings.remote_timeout(),
    })?;
    tracing::debug!(
        target: "confhub::infra",
        base_url = %base_url,
        timeout_ms = settings.remote_timeout().as_millis(),
        "remote configuration enabled"
    );
    Ok(Arc::new(remote))
}

/// Engine over the local filesystem and the configured remote.
pub fn build_engine(
    settings: &ValidatedEngineSettings,
    observability: &Observability,
) -> InfraResult<ConfigEngine> {
    let mut deps = EngineDeps::new(Arc::new(LocalConfigStore::new()), build_remote_port(settings)?);
    deps.logger.clone_from(&observability.logger);
    deps.access_log.clone_from(&observability.access_log);
    Ok(ConfigEngine::new(deps, engine_options(settings)))
}
