use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use tower::ServiceBuilder;

use crate::models::GatewayConfig;
use crate::proxy::activity_log::ActivityLogger;
use crate::proxy::middleware::cors_layer;
use crate::proxy::routes::build_proxy_routes;
use crate::proxy::state::{AppState, CoreServices};
use crate::proxy::upstream::UpstreamClient;

/// Bind and serve. The composition root lives here: the upstream client
/// and activity logger are constructed once and injected through state.
/// Returns the bound address (`port: 0` binds an ephemeral port) and the
/// serve task handle.
pub async fn start_server(
    config: GatewayConfig,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), String> {
    let config = Arc::new(config);

    let core = Arc::new(CoreServices {
        upstream: Arc::new(UpstreamClient::new(config.upstream.clone())),
        activity: Arc::new(ActivityLogger::new(config.activity_log.clone())),
    });
    let state = AppState {
        core,
        config: config.clone(),
    };

    let max_body_size: usize = std::env::var("GANGWAY_MAX_BODY_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100 * 1024 * 1024);

    let app = build_proxy_routes()
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_body_size))
                .layer(cors_layer(&config.allowed_origins)),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Address {} binding failed: {}", addr, e))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {}", e))?;

    tracing::info!("Gateway started at http://{}", local_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Gateway server exited with error: {}", e);
        }
    });

    Ok((local_addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityLogConfig;

    #[tokio::test]
    async fn serves_health_on_an_ephemeral_port() {
        let mut config = GatewayConfig::default();
        config.port = 0;
        config.upstream.streaming_base = Some("http://localhost:9".to_string());
        config.activity_log = ActivityLogConfig {
            enabled: false,
            ..ActivityLogConfig::default()
        };

        let (addr, _handle) = start_server(config).await.unwrap();

        let response = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }
}
