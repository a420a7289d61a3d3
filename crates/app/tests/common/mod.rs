//! Shared fixtures for engine integration tests.

#![allow(dead_code, reason = "each test binary uses a subset of the fixtures")]

use confhub_adapters::remote::ProjectPayload;
use confhub_adapters::{JsonLogger, LocalConfigStore, MemoryLogSink};
use confhub_app::{ConfigEngine, EngineDeps, EngineOptions};
use confhub_domain::{ConfigSnapshot, ProjectId};
use confhub_ports::{BoxFuture, LogLevel, RemoteConfigPort, remote_unavailable_code};
use confhub_shared::{ErrorClass, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

pub const SYSTEM_CONF: &str = "[key]\ntts_module = azure\ngpt_model_engine = gpt-4o\n\n[base]\nlocal_asr_port = 10197\n";
pub const CONFIG_JSON: &str = "{\n    \"attribute\": {\n        \"name\": \"Fei\"\n    }\n}\n";

/// Remote double returning a fixed payload, or failing when none is set.
#[derive(Default)]
pub struct FakeRemote {
    payload: Option<Value>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeRemote {
    pub fn serving(payload: Value) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteConfigPort for FakeRemote {
    fn fetch(
        &self,
        _ctx: &RequestContext,
        project_id: ProjectId,
    ) -> BoxFuture<'_, Result<ConfigSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let Some(payload) = self.payload.clone() else {
                return Err(ErrorEnvelope::unexpected(
                    remote_unavailable_code(),
                    "remote offline",
                    ErrorClass::Retriable,
                ));
            };
            let payload: ProjectPayload = serde_json::from_value(payload).map_err(|error| {
                ErrorEnvelope::unexpected(
                    remote_unavailable_code(),
                    error.to_string(),
                    ErrorClass::NonRetriable,
                )
            })?;
            Ok(payload.into_snapshot(project_id))
        })
    }
}

/// Engine over the local filesystem store.
pub fn engine(remote: Arc<FakeRemote>, options: EngineOptions) -> ConfigEngine {
    ConfigEngine::new(EngineDeps::new(Arc::new(LocalConfigStore::new()), remote), options)
}

/// Engine that also captures JSON log lines.
pub fn logged_engine(
    remote: Arc<FakeRemote>,
    options: EngineOptions,
) -> (ConfigEngine, Arc<MemoryLogSink>) {
    let sink = Arc::new(MemoryLogSink::default());
    let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug);
    let deps = EngineDeps::new(Arc::new(LocalConfigStore::new()), remote)
        .with_logger(Arc::new(logger));
    (ConfigEngine::new(deps, options), sink)
}

/// Create `<root>/<name>` holding the two configuration files.
pub fn write_project(root: &Path, name: &str, system: &str, user: &str) -> std::io::Result<PathBuf> {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("system.conf"), system)?;
    std::fs::write(dir.join("config.json"), user)?;
    Ok(dir)
}

/// File names in `dir`, sorted.
pub fn file_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

/// Parsed JSON log lines.
pub fn log_events(sink: &MemoryLogSink) -> Vec<Value> {
    sink.take()
        .iter()
        .filter_map(|line| serde_json::from_str(line.trim()).ok())
        .collect()
}

/// Event names of parsed log lines.
pub fn event_names(events: &[Value]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| event.get("event").and_then(Value::as_str))
        .map(str::to_owned)
        .collect()
}
