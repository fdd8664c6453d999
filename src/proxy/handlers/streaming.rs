use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::proxy::activity_log::{ActivityEvent, ActivityLogger, LogPhase, LogScope};

/// Copy upstream response headers, dropping the ones that would corrupt
/// streamed delivery: `content-length` (the body may change length and a
/// stale value breaks chunked relay) and the hop-by-hop framing headers.
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if *name == CONTENT_LENGTH || *name == TRANSFER_ENCODING || *name == CONNECTION {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Relay the upstream body chunk by chunk, recording a response audit event
/// once the stream has been fully relayed (or abandoned).
pub fn wrap_stream_with_activity<S>(
    stream: S,
    logger: Arc<ActivityLogger>,
    mut event: ActivityEvent,
    started: Instant,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    async_stream::stream! {
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            yield item;
        }
        event.duration_ms = Some(started.elapsed().as_millis() as u64);
        logger.record(event);
    }
}

/// Pipe an upstream response back to the caller without buffering. Status
/// and sanitized headers pass through verbatim; the body is streamed, so
/// memory use does not scale with response size. Dropping the returned
/// response aborts the upstream read.
pub fn relay_upstream_response(
    response: reqwest::Response,
    logger: Arc<ActivityLogger>,
    scope: LogScope,
    method: &str,
    url: &str,
    started: Instant,
) -> Response {
    let status = response.status();
    let headers = sanitize_response_headers(response.headers());

    let event = ActivityEvent {
        scope,
        phase: LogPhase::Response,
        method: method.to_string(),
        url: url.to_string(),
        status: Some(status.as_u16()),
        duration_ms: None,
        message: None,
    };
    let body = Body::from_stream(wrap_stream_with_activity(
        response.bytes_stream(),
        logger,
        event,
        started,
    ));

    let mut builder = Response::builder().status(status);
    if let Some(out_headers) = builder.headers_mut() {
        out_headers.extend(headers);
    }
    builder.body(body).unwrap_or_else(|e| {
        tracing::error!("Failed to assemble relayed response: {}", e);
        Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .body(Body::empty())
            .unwrap_or_default()
    })
}
