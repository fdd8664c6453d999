use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::json;

use crate::proxy::handlers;
use crate::proxy::state::AppState;

pub fn build_proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check_handler))
        .route("/healthz", get(health_check_handler))
        .route("/*path", any(handlers::forward::forward_entry))
}

async fn health_check_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
