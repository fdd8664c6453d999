use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_LOG_BACKUPS, DEFAULT_LOG_MAX_BYTES, DEFAULT_POOL_SIZE,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::error::{AppError, AppResult};

const CONFIG_FILE: &str = "gangway.json";

/// Upstream base URLs and outbound transport tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the streaming backend (graph execution, runs, history).
    pub streaming_base: Option<String>,
    /// Base URL of the record backend (durable thread CRUD).
    pub record_base: Option<String>,
    /// Service credential attached as `x-api-key` on every outbound call.
    pub service_credential: Option<String>,
    /// Per-request deadline in milliseconds.
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Bound on idle pooled connections per upstream host.
    pub pool_size: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            streaming_base: None,
            record_base: None,
            service_credential: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityLogConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub file: String,
    pub max_bytes: u64,
    pub backups: usize,
}

impl Default for ActivityLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".log"),
            file: "gateway-activity.jsonl".to_string(),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            backups: DEFAULT_LOG_BACKUPS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub upstream: UpstreamConfig,
    pub activity_log: ActivityLogConfig,
    /// CORS origins allowed to hit the gateway. Empty means same-origin only.
    pub allowed_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3123,
            upstream: UpstreamConfig::default(),
            activity_log: ActivityLogConfig::default(),
            allowed_origins: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Unconfigured-and-unfallback-able upstreams are a hard startup error,
    /// never a per-request decision.
    pub fn validate(&self) -> AppResult<()> {
        let upstream = &self.upstream;
        if upstream.streaming_base.is_none() && upstream.record_base.is_none() {
            return Err(AppError::Config(
                "no upstream configured: set streaming_base or record_base (STREAM_API_URL / RECORD_API_URL)"
                    .to_string(),
            ));
        }
        if upstream.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "request_timeout_ms must be non-zero".to_string(),
            ));
        }
        if upstream.pool_size == 0 {
            return Err(AppError::Config("pool_size must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Load config from the optional JSON file, then apply environment overrides.
pub fn load_gateway_config() -> AppResult<GatewayConfig> {
    let path = std::env::var("GANGWAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("failed to parse {}: {}", path.display(), e)))?
    } else {
        GatewayConfig::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .filter(|value| !value.trim().is_empty())
    })
}

pub fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Some(base) = first_env(&["GANGWAY_STREAM_API_URL", "STREAM_API_URL"]) {
        config.upstream.streaming_base = Some(base);
    }
    if let Some(base) = first_env(&["GANGWAY_RECORD_API_URL", "RECORD_API_URL"]) {
        config.upstream.record_base = Some(base);
    }
    if let Some(key) = first_env(&["GANGWAY_API_KEY", "SERVICE_API_KEY"]) {
        config.upstream.service_credential = Some(key);
    }
    if let Some(ms) = first_env(&["GANGWAY_TIMEOUT_MS"]).and_then(|v| v.trim().parse().ok()) {
        config.upstream.request_timeout_ms = ms;
    }
    if let Some(ms) = first_env(&["GANGWAY_CONNECT_TIMEOUT_MS"]).and_then(|v| v.trim().parse().ok())
    {
        config.upstream.connect_timeout_ms = ms;
    }
    if let Some(n) = first_env(&["GANGWAY_CONNECTIONS"]).and_then(|v| v.trim().parse().ok()) {
        config.upstream.pool_size = n;
    }
    if let Some(host) = first_env(&["GANGWAY_HOST"]) {
        config.host = host;
    }
    if let Some(port) = first_env(&["GANGWAY_PORT"]).and_then(|v| v.trim().parse().ok()) {
        config.port = port;
    }
    if let Some(dir) = first_env(&["GANGWAY_LOG_DIR"]) {
        config.activity_log.dir = PathBuf::from(dir);
    }
    if let Some(file) = first_env(&["GANGWAY_LOG_FILE"]) {
        config.activity_log.file = file;
    }
    if let Some(bytes) = first_env(&["GANGWAY_LOG_MAX_BYTES"]).and_then(|v| v.trim().parse().ok()) {
        config.activity_log.max_bytes = bytes;
    }
    if let Some(backups) = first_env(&["GANGWAY_LOG_BACKUPS"]).and_then(|v| v.trim().parse().ok()) {
        config.activity_log.backups = backups;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_upstreams() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_with_single_base_validates() {
        let mut config = GatewayConfig::default();
        config.upstream.record_base = Some("http://records.local".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = GatewayConfig::default();
        config.upstream.streaming_base = Some("http://stream.local".to_string());
        config.upstream.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = GatewayConfig::default();
        config.upstream.streaming_base = Some("http://stream.local".to_string());
        config.activity_log.backups = 3;
        let text = serde_json::to_string(&config).unwrap();
        let parsed: GatewayConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.upstream.streaming_base, config.upstream.streaming_base);
        assert_eq!(parsed.activity_log.backups, 3);
    }
}
