//! Access log adapter writing one JSON object per record.

use crate::log_sink::LogSink;
use confhub_ports::{AccessLogPort, AccessRecord, BoxFuture, ProjectId};
use confhub_shared::{RequestContext, Result};
use serde_json::json;
use std::sync::Arc;

/// Access log writing JSON lines to a sink.
#[derive(Clone)]
pub struct JsonLinesAccessLog {
    sink: Arc<dyn LogSink>,
}

impl JsonLinesAccessLog {
    /// Build an access log over `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

impl AccessLogPort for JsonLinesAccessLog {
    fn record(&self, ctx: &RequestContext, record: AccessRecord) -> BoxFuture<'_, Result<()>> {
        let correlation_id = ctx.correlation_id().as_str().to_owned();
        Box::pin(async move {
            let line = json!({
                "timestampMs": record.timestamp_ms,
                "correlationId": correlation_id,
                "projectId": record.project_id.as_ref().map(ProjectId::as_str),
                "operation": record.operation.as_str(),
                "keyPath": record.key_path.as_ref(),
                "outcome": record.outcome.to_string(),
            });
            let mut encoded = line.to_string();
            encoded.push('\n');
            self.sink.write_line(&encoded);
            Ok(())
        })
    }
}
