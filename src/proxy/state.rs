use std::sync::Arc;

use crate::models::GatewayConfig;
use crate::proxy::activity_log::ActivityLogger;
use crate::proxy::upstream::UpstreamClient;

/// Long-lived services built once at the composition root and shared by
/// every in-flight request.
pub struct CoreServices {
    pub upstream: Arc<UpstreamClient>,
    pub activity: Arc<ActivityLogger>,
}

/// Axum application state.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<CoreServices>,
    pub config: Arc<GatewayConfig>,
}

impl axum::extract::FromRef<AppState> for Arc<CoreServices> {
    fn from_ref(state: &AppState) -> Self {
        state.core.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<GatewayConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
