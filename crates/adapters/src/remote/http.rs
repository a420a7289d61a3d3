//! HTTP client for the remote configuration service.

use super::wire::FetchResponse;
use confhub_ports::{
    BoxFuture, ConfigSnapshot, ProjectId, RemoteConfigPort, remote_unavailable_code,
};
use confhub_shared::{
    ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString, timeout_with_context,
};
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";
const FETCH_OPERATION: &str = "remote.fetch";

/// Remote client options.
#[derive(Debug, Clone)]
pub struct HttpRemoteConfigOptions {
    /// Service base URL (`http`/`https`).
    pub base_url: Box<str>,
    /// Value of the `X-API-Key` header.
    pub api_key: Option<SecretString>,
    /// Bound on one fetch, connection included.
    pub timeout: Duration,
}

/// `RemoteConfigPort` over `GET {base}/api/projects/{id}/config`.
///
/// Every failure surfaces as `remote:unavailable`; there is no retry here.
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpRemoteConfig {
    /// Build the client.
    pub fn new(options: HttpRemoteConfigOptions) -> Result<Self> {
        let base_url = Url::parse(options.base_url.trim()).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                format!("invalid remote base url: {error}"),
            )
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "remote base url must be an http(s) URL",
            ));
        }
        if options.timeout.is_zero() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "remote timeout must be greater than zero",
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = options.api_key.as_ref() {
            let mut value = HeaderValue::from_str(api_key.expose()).map_err(|_| {
                ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "api key contains invalid header characters",
                )
            })?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("remote", "client_init_failed"),
                    format!("failed to build remote config client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout: options.timeout,
        })
    }

    /// Endpoint for `project_id`; the id is percent-encoded as one path segment.
    pub fn endpoint(&self, project_id: &ProjectId) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ErrorEnvelope::expected(ErrorCode::invalid_input(), "remote base url has no path")
            })?
            .pop_if_empty()
            .extend(["api", "projects", project_id.as_str(), "config"]);
        Ok(url)
    }

    async fn fetch_response(&self, url: Url, project_id: &ProjectId) -> Result<FetchResponse> {
        tracing::debug!(
            target: "confhub::remote",
            project_id = %project_id,
            url = %url,
            "fetching remote configuration"
        );
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| map_reqwest_error(project_id, &error))?;

        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|error| map_reqwest_error(project_id, &error))?;
        if !status.is_success() {
            return Err(unavailable(
                project_id,
                "http_status",
                format!("remote service returned HTTP {status}"),
            )
            .with_metadata("status", status.as_u16().to_string()));
        }

        serde_json::from_slice(&payload).map_err(|error| {
            unavailable(
                project_id,
                "invalid_response",
                format!("failed to decode remote configuration: {error}"),
            )
        })
    }
}

impl RemoteConfigPort for HttpRemoteConfig {
    fn fetch(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
    ) -> BoxFuture<'_, Result<ConfigSnapshot>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let url = self.endpoint(&project_id)?;
            let response = timeout_with_context(
                &ctx,
                self.timeout,
                FETCH_OPERATION,
                self.fetch_response(url, &project_id),
            )
            .await
            .map_err(|error| into_unavailable(&project_id, error))?;

            if !response.success {
                let message = response
                    .message
                    .unwrap_or_else(|| "remote service reported failure".to_string());
                return Err(unavailable(&project_id, "rejected", message));
            }
            Ok(response
                .project
                .unwrap_or_default()
                .into_snapshot(project_id))
        })
    }
}

/// Remote port used when no service is configured: every fetch fails fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRemoteConfig;

impl RemoteConfigPort for DisabledRemoteConfig {
    fn fetch(
        &self,
        _ctx: &RequestContext,
        project_id: ProjectId,
    ) -> BoxFuture<'_, Result<ConfigSnapshot>> {
        Box::pin(async move {
            Err(unavailable(
                &project_id,
                "not_configured",
                "remote configuration service is not configured",
            ))
        })
    }

    fn is_configured(&self) -> bool {
        false
    }
}

fn unavailable(
    project_id: &ProjectId,
    reason: &'static str,
    message: impl Into<String>,
) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(remote_unavailable_code(), message, ErrorClass::Retriable)
        .with_metadata("project_id", project_id.as_str())
        .with_metadata("reason", reason)
}

fn into_unavailable(project_id: &ProjectId, error: ErrorEnvelope) -> ErrorEnvelope {
    if error.is_cancelled() || error.code == remote_unavailable_code() {
        return error;
    }
    let reason = if error.code == ErrorCode::timeout() {
        "timeout"
    } else {
        "transport"
    };
    unavailable(project_id, reason, error.message).with_metadata("cause", error.code.to_string())
}

fn map_reqwest_error(project_id: &ProjectId, error: &reqwest::Error) -> ErrorEnvelope {
    let reason = if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else {
        "transport"
    };
    unavailable(project_id, reason, format!("remote request failed: {error}"))
}
