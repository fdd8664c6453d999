use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// CORS for the browser client. An empty origin list keeps the gateway
/// same-origin only.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-api-key"),
            header::HeaderName::from_static("x-tenant-id"),
        ])
        .allow_credentials(false)
        .max_age(std::time::Duration::from_secs(3600));

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            let trimmed = origin.trim();
            match HeaderValue::from_str(trimmed) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                    None
                }
            }
        })
        .collect();

    base.allow_origin(origins)
}
