use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{FORWARDED_HEADERS, SERVICE_CREDENTIAL_HEADER, TENANT_HEADER};

/// Build the outbound header set from an inbound request.
///
/// Only the allow-listed headers are forwarded; everything else is dropped
/// at this boundary. `accept-encoding` is never forwarded so an upstream
/// cannot compress a response the gateway intends to relay incrementally.
/// The service credential, when configured, is attached on every call.
pub fn build_outbound_headers(inbound: &HeaderMap, credential: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        let header_name = HeaderName::from_static(name);
        if let Some(value) = inbound.get(&header_name) {
            headers.insert(header_name, value.clone());
        }
    }

    if let Some(key) = credential {
        if let Ok(value) = HeaderValue::from_str(key) {
            headers.insert(HeaderName::from_static(SERVICE_CREDENTIAL_HEADER), value);
        }
    }

    headers
}

/// Force SSE negotiation on streaming run paths regardless of what the
/// client sent.
pub fn force_event_stream_accept(headers: &mut HeaderMap) {
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
}

pub fn tenant_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok())
}

/// Caller-supplied `input` for a run start. Kept as an explicit
/// object-vs-primitive union so the "only inject into object inputs" rule is
/// a checked match arm instead of a runtime type probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunInput {
    Object(Map<String, Value>),
    Other(Value),
}

/// Typed view of a run-start body. Unknown caller fields ride along in
/// `extra` and are re-serialized untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<RunInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunStartPayload {
    /// Inject the correlation identifier (the thread id) and tenant context.
    ///
    /// A caller-supplied `session_id` is preserved; a primitive `input` is
    /// left alone.
    pub fn inject_correlation(&mut self, thread_id: &str, tenant_id: Option<&str>) {
        if let Some(RunInput::Object(input)) = self.input.as_mut() {
            input
                .entry("session_id".to_string())
                .or_insert_with(|| Value::String(thread_id.to_string()));
        }

        if self.session_id.is_none() {
            self.session_id = Some(thread_id.to_string());
        }

        let context = self.context.get_or_insert_with(Map::new);
        context.insert(
            "session_id".to_string(),
            Value::String(thread_id.to_string()),
        );
        if let Some(tenant) = tenant_id {
            context.insert("tenant_id".to_string(), Value::String(tenant.to_string()));
        }
    }
}

/// Whether this call is a run start whose body is eligible for injection:
/// a mutating method on `threads/{id}/runs*`.
pub fn is_run_start(method: &Method, segments: &[&str]) -> bool {
    if method == Method::GET || method == Method::HEAD {
        return false;
    }
    segments.first() == Some(&"threads")
        && segments.len() >= 3
        && segments[2].starts_with("runs")
}

/// Rewrite a run-start body, returning `None` when the body should pass
/// through untouched: empty bodies (checkpoint resume), non-object JSON, or
/// anything that fails to parse.
pub fn rewrite_run_start_body(
    body: &[u8],
    thread_id: &str,
    tenant_id: Option<&str>,
) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(body).ok()?;
    if !text.trim_start().starts_with('{') {
        return None;
    }

    let mut payload: RunStartPayload = serde_json::from_str(text).ok()?;
    payload.inject_correlation(thread_id, tenant_id);
    serde_json::to_vec(&payload).ok()
}

/// Stamp `content-type: application/json` after a successful rewrite.
pub fn set_json_content_type(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
}
