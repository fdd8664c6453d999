use std::time::Instant;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use serde_json::json;

use crate::constants::{SERVICE_CREDENTIAL_HEADER, TENANT_HEADER};
use crate::models::GatewayConfig;
use crate::proxy::activity_log::{ActivityEvent, LogPhase, LogScope};
use crate::proxy::handlers::errors::thread_missing_response;
use crate::proxy::handlers::forward::dispatch;
use crate::proxy::handlers::streaming::relay_upstream_response;
use crate::proxy::router::{resolve_base, UpstreamKind};
use crate::proxy::state::CoreServices;

/// Everything needed to replay the original call once after recreating its
/// thread. Lives for a single inbound request.
pub struct RecoveryAttempt<'a> {
    pub thread_id: &'a str,
    pub method: Method,
    pub url: &'a str,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub scope: LogScope,
}

/// Stale-thread recovery: recreate the thread on the streaming backend,
/// then retry the original request exactly once. Any failure along the way
/// collapses into the synthesized `thread_missing` 404; this path never
/// loops.
pub async fn recover_missing_thread(
    core: &CoreServices,
    config: &GatewayConfig,
    attempt: RecoveryAttempt<'_>,
    started: Instant,
) -> Response {
    tracing::info!(
        thread_id = %attempt.thread_id,
        "Upstream 404 on run path, attempting thread recreation"
    );

    if !create_thread(core, config, attempt.thread_id, &attempt.headers).await {
        record_failure(core, &attempt, started, "thread recreation failed");
        return thread_missing_response(attempt.thread_id);
    }

    match dispatch(
        &core.upstream,
        attempt.method.clone(),
        attempt.url,
        attempt.headers.clone(),
        attempt.body.clone(),
    )
    .await
    {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => {
            tracing::info!(thread_id = %attempt.thread_id, "Retry after recreation succeeded");
            relay_upstream_response(
                response,
                core.activity.clone(),
                attempt.scope,
                attempt.method.as_str(),
                attempt.url,
                started,
            )
        }
        Ok(_) => {
            record_failure(core, &attempt, started, "retry after recreation returned 404");
            thread_missing_response(attempt.thread_id)
        }
        Err(e) => {
            tracing::warn!(
                thread_id = %attempt.thread_id,
                "Retry after recreation failed: {}",
                e
            );
            record_failure(core, &attempt, started, "retry after recreation failed");
            thread_missing_response(attempt.thread_id)
        }
    }
}

/// Best-effort create: `POST {streaming_base}/threads` with the original
/// id. Only the response status matters; errors are consumed here.
async fn create_thread(
    core: &CoreServices,
    config: &GatewayConfig,
    thread_id: &str,
    original_headers: &HeaderMap,
) -> bool {
    let Some(base) = resolve_base(&config.upstream, UpstreamKind::Streaming) else {
        return false;
    };
    let url = format!("{}/threads", base.trim_end_matches('/'));

    let mut request = core
        .upstream
        .request(Method::POST, &url)
        .json(&json!({ "thread_id": thread_id }));
    if let Some(tenant) = original_headers.get(TENANT_HEADER) {
        request = request.header(TENANT_HEADER, tenant.clone());
    }
    if let Some(credential) = original_headers.get(SERVICE_CREDENTIAL_HEADER) {
        request = request.header(SERVICE_CREDENTIAL_HEADER, credential.clone());
    }

    match request.send().await {
        Ok(response) => {
            let ok = response.status().is_success();
            if !ok {
                tracing::warn!(
                    thread_id = %thread_id,
                    status = %response.status(),
                    "Thread recreation rejected by upstream"
                );
            }
            ok
        }
        Err(e) => {
            tracing::debug!(thread_id = %thread_id, "Thread recreation call failed: {}", e);
            false
        }
    }
}

fn record_failure(
    core: &CoreServices,
    attempt: &RecoveryAttempt<'_>,
    started: Instant,
    message: &str,
) {
    core.activity.record(ActivityEvent {
        scope: attempt.scope,
        phase: LogPhase::Error,
        method: attempt.method.to_string(),
        url: attempt.url.to_string(),
        status: Some(StatusCode::NOT_FOUND.as_u16()),
        duration_ms: Some(started.elapsed().as_millis() as u64),
        message: Some(message.to_string()),
    });
}
