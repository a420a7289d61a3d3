//! Ports the engine runs against.

use confhub_ports::{AccessLogPort, ConfigStorePort, LogFields, LoggerPort, RemoteConfigPort};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Dependencies required by the configuration engine.
#[derive(Clone)]
pub struct EngineDeps {
    /// Local file store.
    pub store: Arc<dyn ConfigStorePort>,
    /// Remote configuration service.
    pub remote: Arc<dyn RemoteConfigPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional access log sink.
    pub access_log: Option<Arc<dyn AccessLogPort>>,
}

impl EngineDeps {
    /// Deps without logger or access log.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStorePort>, remote: Arc<dyn RemoteConfigPort>) -> Self {
        Self {
            store,
            remote,
            logger: None,
            access_log: None,
        }
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Attach an access log sink.
    #[must_use]
    pub fn with_access_log(mut self, access_log: Arc<dyn AccessLogPort>) -> Self {
        self.access_log = Some(access_log);
        self
    }

    pub(crate) fn info(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.info(event, message, Some(fields));
        }
    }

    pub(crate) fn debug(&self, event: &str, message: &str, fields: LogFields) {
        if let Some(logger) = self.logger.as_ref() {
            logger.debug(event, message, Some(fields));
        }
    }
}

pub(crate) fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
