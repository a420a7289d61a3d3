//! # confhub-adapters
//!
//! Adapter implementations for ports (local files, remote service, logging).
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod access_log;
pub mod log_sink;
pub mod logger;
pub mod remote;
pub mod store;

pub use access_log::JsonLinesAccessLog;
pub use log_sink::{FileLogSink, LogSink, MemoryLogSink, StderrLogSink};
pub use logger::{JsonLogger, NoopLogger};
pub use remote::{DisabledRemoteConfig, HttpRemoteConfig, HttpRemoteConfigOptions, ProjectPayload};
pub use store::{LocalConfigStore, STAGING_SUFFIX};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use confhub_ports::ports_crate_version;
    use confhub_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("confhub-") {
                let key = line.split('=').next().unwrap_or("").trim();
                deps.push(key.split('.').next().unwrap_or("").trim().to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_infra() {
        let deps = workspace_deps();
        let forbidden = ["confhub-app", "confhub-infra", "confhub-config"];

        for dep in &deps {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_can_use_ports_and_shared() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
