use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// 422 for `threads/undefined/...` and `threads/null/...`: a client-side
/// bug surfaced a broken thread reference; never forwarded upstream.
pub fn invalid_thread_id_response(thread_id: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": "invalid_thread_id",
            "message": format!("'{}' is not a valid thread id", thread_id),
        })),
    )
        .into_response()
}

/// 422 for `threads/runs` / `threads/history` collection routes invoked
/// without a thread id.
pub fn missing_thread_id_response(subresource: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": "missing_thread_id",
            "message": format!("'{}' requires a thread id in the path", subresource),
        })),
    )
        .into_response()
}

/// Structured 404 shown to the client when recovery could not resurrect a
/// thread. Never a raw passthrough of the upstream error body.
pub fn thread_missing_response(thread_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "thread_missing",
            "message": "Thread expired or missing. Start a new chat.",
            "thread_id": thread_id,
        })),
    )
        .into_response()
}

/// 502 for transport-level failures. The message names the failure class
/// only; internal upstream URLs are not leaked to the client.
pub fn upstream_unreachable_response(kind: &str) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": "upstream_unreachable",
            "message": format!("Upstream request failed: {}", kind),
        })),
    )
        .into_response()
}

/// 500 for the should-never-happen case of no resolvable upstream base
/// (startup validation rejects this configuration).
pub fn gateway_misconfigured_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "gateway_misconfigured",
            "message": "No upstream base URL is configured",
        })),
    )
        .into_response()
}
