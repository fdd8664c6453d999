use std::time::Instant;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use bytes::Bytes;

use crate::proxy::activity_log::{ActivityEvent, LogPhase, LogScope};
use crate::proxy::handlers::errors::{
    gateway_misconfigured_response, invalid_thread_id_response, missing_thread_id_response,
    upstream_unreachable_response,
};
use crate::proxy::handlers::recovery::{recover_missing_thread, RecoveryAttempt};
use crate::proxy::handlers::streaming::relay_upstream_response;
use crate::proxy::rewrite::{
    build_outbound_headers, force_event_stream_accept, is_run_start, rewrite_run_start_body,
    set_json_content_type, tenant_id_from_headers,
};
use crate::proxy::router::{
    build_target_url, classify, is_run_scoped, is_stream_run, resolve_base, UpstreamKind,
};
use crate::proxy::state::AppState;
use crate::proxy::upstream::UpstreamClient;

/// Wildcard entry point: every proxied verb lands here. The inbound body is
/// read fully before forwarding; the response is streamed back.
pub async fn forward_entry(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, method, &path, query.as_deref(), &headers, body).await
}

/// The forwarding state machine: guards, routing, rewriting, dispatch,
/// streaming relay, and the one-shot 404 recovery.
pub async fn forward(
    state: &AppState,
    method: Method,
    path: &str,
    query: Option<&str>,
    inbound: &HeaderMap,
    body: Bytes,
) -> Response {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // ROUTING: reject broken thread references before any upstream call.
    if let Some(response) = thread_path_guard(&segments) {
        return response;
    }

    let kind = classify(&segments);
    let Some(base) = resolve_base(&state.config.upstream, kind) else {
        tracing::error!("No upstream base resolvable for {} traffic", kind.as_str());
        return gateway_misconfigured_response();
    };
    let url = build_target_url(base, &segments, query);
    let scope = match kind {
        UpstreamKind::Streaming => LogScope::Streaming,
        UpstreamKind::Record => LogScope::Record,
    };

    // REWRITING: allow-listed headers, credential, correlation injection.
    let mut out_headers = build_outbound_headers(
        inbound,
        state.config.upstream.service_credential.as_deref(),
    );
    let mut out_body = body;
    if is_run_start(&method, &segments) && !out_body.is_empty() {
        let thread_id = segments[1];
        let tenant = tenant_id_from_headers(inbound);
        if let Some(rewritten) = rewrite_run_start_body(&out_body, thread_id, tenant) {
            out_body = Bytes::from(rewritten);
            set_json_content_type(&mut out_headers);
        }
    }
    if is_stream_run(&segments) {
        force_event_stream_accept(&mut out_headers);
    }
    let out_body = (method != Method::GET && method != Method::HEAD).then_some(out_body);

    // DISPATCHING
    let started = Instant::now();
    state.core.activity.record(ActivityEvent {
        scope,
        phase: LogPhase::Request,
        method: method.to_string(),
        url: url.clone(),
        status: None,
        duration_ms: None,
        message: None,
    });

    match dispatch(
        &state.core.upstream,
        method.clone(),
        &url,
        out_headers.clone(),
        out_body.clone(),
    )
    .await
    {
        Ok(response) => {
            // RECOVERING: only run/history paths, only on 404, at most once.
            if response.status() == StatusCode::NOT_FOUND && is_run_scoped(&segments) {
                let attempt = RecoveryAttempt {
                    thread_id: segments[1],
                    method,
                    url: &url,
                    headers: out_headers,
                    body: out_body,
                    scope,
                };
                return recover_missing_thread(&state.core, &state.config, attempt, started)
                    .await;
            }

            // STREAMING: non-2xx passes through verbatim like any other
            // response; the gateway does not reinterpret upstream errors.
            relay_upstream_response(
                response,
                state.core.activity.clone(),
                scope,
                method.as_str(),
                &url,
                started,
            )
        }
        Err(e) => {
            let class = classify_transport_error(&e);
            tracing::warn!(
                method = %method,
                target = %url,
                elapsed_ms = started.elapsed().as_millis() as u64,
                class,
                "Upstream request failed: {}",
                e
            );
            state.core.activity.record(ActivityEvent {
                scope,
                phase: LogPhase::Error,
                method: method.to_string(),
                url,
                status: None,
                duration_ms: Some(started.elapsed().as_millis() as u64),
                message: Some(format!("{}: {}", class, e)),
            });
            upstream_unreachable_response(class)
        }
    }
}

/// Issue one outbound call with the forwarded headers and optional body.
pub(crate) async fn dispatch(
    upstream: &UpstreamClient,
    method: Method,
    url: &str,
    headers: HeaderMap,
    body: Option<Bytes>,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut request = upstream.request(method, url).headers(headers);
    if let Some(bytes) = body {
        request = request.body(bytes);
    }
    request.send().await
}

/// 422 guards for `threads/...` paths: literal `undefined`/`null` ids from
/// broken client references, and id-requiring subresources invoked on the
/// collection route.
fn thread_path_guard(segments: &[&str]) -> Option<Response> {
    if segments.first() != Some(&"threads") {
        return None;
    }
    match segments.get(1) {
        Some(id @ (&"undefined" | &"null")) => Some(invalid_thread_id_response(id)),
        Some(sub @ (&"runs" | &"history")) => Some(missing_thread_id_response(sub)),
        _ => None,
    }
}

fn classify_transport_error(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else if error.is_request() {
        "request"
    } else if error.is_body() || error.is_decode() {
        "body"
    } else {
        "transport"
    }
}
