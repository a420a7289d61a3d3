//! Structured logging boundary contract.

use confhub_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Log level, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    /// Lower-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a level label (case-insensitive). `warning` is accepted.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Additional event fields.
pub type LogFields = BTreeMap<Box<str>, serde_json::Value>;

/// Build `LogFields` from key/value pairs.
pub fn log_fields<I, K, V>(pairs: I) -> LogFields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Box<str>>,
    V: Into<serde_json::Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Stable dotted event name (`config.load.start`).
    pub event: Box<str>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message (safe, redacted).
    pub message: Box<str>,
    /// Optional structured fields.
    pub fields: Option<LogFields>,
    /// Optional error payload.
    pub error: Option<serde_json::Value>,
}

impl LogEvent {
    /// Build an event without an error payload.
    #[must_use]
    pub fn new(level: LogLevel, event: &str, message: &str, fields: Option<LogFields>) -> Self {
        Self {
            event: event.into(),
            level,
            message: message.into(),
            fields,
            error: None,
        }
    }

    /// Attach an error envelope as the error payload.
    #[must_use]
    pub fn with_error(mut self, error: &ErrorEnvelope) -> Self {
        self.error = Some(error_payload(error));
        self
    }
}

/// Serialize an envelope for the `error` field of a log line.
#[must_use]
pub fn error_payload(error: &ErrorEnvelope) -> serde_json::Value {
    serde_json::json!({
        "code": error.code.to_string(),
        "kind": error.kind.to_string(),
        "class": error.class.to_string(),
        "message": error.message,
        "metadata": error.metadata,
    })
}

/// Boundary contract for structured logging.
pub trait LoggerPort: Send + Sync {
    /// Emit a structured event.
    fn log(&self, event: LogEvent);

    /// Create a child logger with base fields applied to every event.
    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort>;

    /// Convenience: debug event.
    fn debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(LogLevel::Debug, event, message, fields));
    }

    /// Convenience: info event.
    fn info(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(LogLevel::Info, event, message, fields));
    }

    /// Convenience: warn event.
    fn warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(LogLevel::Warn, event, message, fields));
    }

    /// Convenience: error event.
    fn error(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent::new(LogLevel::Error, event, message, fields));
    }

    /// Convenience: event carrying an error envelope.
    fn failure(
        &self,
        level: LogLevel,
        event: &str,
        error: &ErrorEnvelope,
        fields: Option<LogFields>,
    ) {
        self.log(LogEvent::new(level, event, &error.message, fields).with_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confhub_shared::ErrorCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<LogEvent>>);

    impl LoggerPort for Capture {
        fn log(&self, event: LogEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event);
            }
        }

        fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
            Box::new(Self::default())
        }
    }

    #[test]
    fn levels_parse_and_order() {
        assert_eq!(LogLevel::parse(" WARNING "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn failure_attaches_the_envelope() {
        let logger = Capture::default();
        let error = ErrorEnvelope::expected(ErrorCode::new("config", "not_found"), "missing");
        logger.failure(
            LogLevel::Warn,
            "config.mutate.failed",
            &error,
            Some(log_fields([("keyPath", "config.a")])),
        );

        let events = logger.0.lock().map(|events| events.clone()).unwrap_or_default();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.level, LogLevel::Warn);
        assert_eq!(event.message.as_ref(), "missing");
        assert_eq!(
            event.error.as_ref().and_then(|error| error.get("code")),
            Some(&serde_json::json!("config:not_found"))
        );
    }
}
