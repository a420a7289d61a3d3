//! HTTP remote configuration client against a mock service.

use confhub_adapters::remote::{HttpRemoteConfig, HttpRemoteConfigOptions};
use confhub_domain::{Origin, resolve};
use confhub_ports::{ProjectId, RemoteConfigPort, remote_unavailable_code};
use confhub_shared::{ErrorEnvelope, RequestContext, Result, SecretString};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_for(server: &MockServer, timeout: Duration) -> Result<HttpRemoteConfig> {
    HttpRemoteConfig::new(HttpRemoteConfigOptions {
        base_url: server.uri().into(),
        api_key: Some(SecretString::new("example")), // pragma: allowlist secret
        timeout,
    })
}

fn project(id: &str) -> Result<ProjectId> {
    ProjectId::parse(id).map_err(ErrorEnvelope::from)
}

async fn fetch_error(remote: &HttpRemoteConfig, id: &str) -> Result<ErrorEnvelope> {
    match remote.fetch(&RequestContext::new_request(), project(id)?).await {
        Ok(_) => Err(ErrorEnvelope::expected(
            confhub_shared::ErrorCode::internal(),
            "expected the fetch to fail",
        )),
        Err(error) => Ok(error),
    }
}

#[tokio::test]
async fn fetch_translates_a_successful_payload() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/fay/config"))
        .and(header("x-api-key", "example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "project": {
                "name": "Fay",
                "description": "digital human",
                "system_config": { "key": { "tts_module": "azure", "local_asr_port": 10197 } },
                "config_json": { "attribute": { "name": "Fei" } }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = remote_for(&server, Duration::from_secs(5))?;
    let snapshot = remote
        .fetch(&RequestContext::new_request(), project("fay")?)
        .await?;

    assert_eq!(snapshot.origin, Origin::Remote);
    assert_eq!(snapshot.project_id, Some(project("fay")?));
    assert_eq!(snapshot.metadata.description.as_ref(), "digital human");
    assert_eq!(resolve(&snapshot, "tts_module", Value::Null), json!("azure"));
    assert_eq!(
        resolve(&snapshot, "system.local_asr_port", Value::Null),
        json!("10197")
    );
    assert_eq!(
        resolve(&snapshot, "config.attribute.name", Value::Null),
        json!("Fei")
    );
    Ok(())
}

#[tokio::test]
async fn unsuccessful_envelope_is_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/ghost/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "project not found"
        })))
        .mount(&server)
        .await;

    let remote = remote_for(&server, Duration::from_secs(5))?;
    let error = fetch_error(&remote, "ghost").await?;

    assert_eq!(error.code, remote_unavailable_code());
    assert_eq!(error.message, "project not found");
    assert_eq!(
        error.metadata.get("reason").map(String::as_str),
        Some("rejected")
    );
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/fay/config"))
        .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
        .mount(&server)
        .await;

    let remote = remote_for(&server, Duration::from_secs(5))?;
    let error = fetch_error(&remote, "fay").await?;

    assert_eq!(error.code, remote_unavailable_code());
    assert_eq!(error.metadata.get("status").map(String::as_str), Some("401"));
    assert!(error.class.is_retriable());
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let remote = remote_for(&server, Duration::from_secs(5))?;
    let error = fetch_error(&remote, "fay").await?;

    assert_eq!(error.code, remote_unavailable_code());
    assert_eq!(
        error.metadata.get("reason").map(String::as_str),
        Some("invalid_response")
    );
    Ok(())
}

#[tokio::test]
async fn slow_service_times_out_as_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "project": {} }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let remote = remote_for(&server, Duration::from_millis(50))?;
    let error = fetch_error(&remote, "fay").await?;

    assert_eq!(error.code, remote_unavailable_code());
    assert_eq!(
        error.metadata.get("reason").map(String::as_str),
        Some("timeout")
    );
    Ok(())
}

#[tokio::test]
async fn cancelled_context_is_not_reported_as_unavailable() -> Result<()> {
    let server = MockServer::start().await;
    let remote = remote_for(&server, Duration::from_secs(5))?;
    let ctx = RequestContext::new_request();
    ctx.cancellation_token().cancel();

    let error = remote
        .fetch(&ctx, project("fay")?)
        .await
        .err()
        .ok_or_else(|| ErrorEnvelope::cancelled("expected cancellation"))?;
    assert!(error.is_cancelled());
    Ok(())
}
