//! Logger and access-log selection from the environment.

use crate::InfraResult;
use confhub_adapters::{FileLogSink, JsonLinesAccessLog, JsonLogger, LogSink, StderrLogSink};
use confhub_ports::{AccessLogPort, LogFields, LogLevel, LoggerPort};
use confhub_shared::{ErrorEnvelope, RequestContext};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// `json` enables structured logs on stderr.
pub const LOG_FORMAT_ENV: &str = "CONFHUB_LOG_FORMAT";
/// Minimum log level (`debug`, `info`, `warn`, `error`).
pub const LOG_LEVEL_ENV: &str = "CONFHUB_LOG_LEVEL";
/// File receiving one JSON access record per resolve/set/delete.
pub const ACCESS_LOG_ENV: &str = "CONFHUB_ACCESS_LOG";

/// Optional logger and access log wired into the engine.
#[derive(Clone, Default)]
pub struct Observability {
    /// Structured logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Access log sink.
    pub access_log: Option<Arc<dyn AccessLogPort>>,
}

/// Observability selected from the process environment.
pub fn observability_from_env() -> InfraResult<Observability> {
    let vars: BTreeMap<String, String> = [LOG_FORMAT_ENV, LOG_LEVEL_ENV, ACCESS_LOG_ENV]
        .into_iter()
        .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_owned(), value)))
        .collect();
    observability_from_vars(&vars)
}

/// Observability selected from explicit variables.
pub fn observability_from_vars(vars: &BTreeMap<String, String>) -> InfraResult<Observability> {
    let log_enabled = vars
        .get(LOG_FORMAT_ENV)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("json"));
    let logger: Option<Arc<dyn LoggerPort>> = if log_enabled {
        let sink: Arc<dyn LogSink> = Arc::new(StderrLogSink);
        let level = vars
            .get(LOG_LEVEL_ENV)
            .and_then(|value| LogLevel::parse(value))
            .unwrap_or(LogLevel::Info);
        Some(Arc::new(JsonLogger::new(sink).with_min_level(level)))
    } else {
        None
    };

    let access_log: Option<Arc<dyn AccessLogPort>> = match vars
        .get(ACCESS_LOG_ENV)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
    {
        Some(path) => Some(Arc::new(JsonLinesAccessLog::new(open_sink(Path::new(path))?))),
        None => None,
    };

    Ok(Observability { logger, access_log })
}

fn open_sink(path: &Path) -> InfraResult<Arc<dyn LogSink>> {
    let sink = FileLogSink::open(path).map_err(|error| {
        ErrorEnvelope::from(error)
            .with_metadata("path", path.display().to_string())
            .with_metadata("env_var", ACCESS_LOG_ENV)
    })?;
    Ok(Arc::new(sink))
}

/// Child logger carrying the request's correlation id.
pub fn scope_logger(
    logger: Option<&Arc<dyn LoggerPort>>,
    ctx: &RequestContext,
) -> Option<Arc<dyn LoggerPort>> {
    let logger = logger?;
    let mut fields = LogFields::new();
    fields.insert(
        "correlationId".into(),
        Value::String(ctx.correlation_id().as_str().to_owned()),
    );
    Some(Arc::from(logger.child(fields)))
}
