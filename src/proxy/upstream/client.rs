use std::time::Duration;

use reqwest::Client;

use crate::constants::TRANSPORT_TIMEOUT_CUSHION_MS;
use crate::models::UpstreamConfig;

/// Owner of the outbound connection pool.
///
/// The inner `reqwest::Client` is built once at the composition root and
/// reused for every request, so a bad transport configuration fails at
/// startup rather than on the first proxied call. Transport-level timeouts
/// sit a fixed cushion above the per-request deadline so the deadline, not
/// an incidental transport timeout, is what terminates a hung call.
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Self {
        let transport_timeout = Duration::from_millis(
            config
                .request_timeout_ms
                .saturating_add(TRANSPORT_TIMEOUT_CUSHION_MS),
        );
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(transport_timeout)
            .pool_max_idle_per_host(config.pool_size)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .expect("Failed to create upstream HTTP client");

        Self { client, config }
    }

    /// Per-request cancellation deadline.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    /// Start an outbound request with the cancellation deadline attached.
    /// Dropping the response (or its body stream) aborts the upstream call,
    /// which is how a client disconnect propagates.
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client.request(method, url).timeout(self.deadline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_comes_from_config() {
        let config = UpstreamConfig {
            request_timeout_ms: 1_000,
            ..UpstreamConfig::default()
        };
        let upstream = UpstreamClient::new(config);
        assert_eq!(upstream.deadline(), Duration::from_millis(1_000));
    }

    #[test]
    fn outbound_requests_carry_the_deadline() {
        let config = UpstreamConfig {
            request_timeout_ms: 1_000,
            ..UpstreamConfig::default()
        };
        let upstream = UpstreamClient::new(config);
        let request = upstream
            .request(reqwest::Method::GET, "http://localhost/threads")
            .build()
            .unwrap();
        assert_eq!(request.timeout(), Some(&Duration::from_millis(1_000)));
    }
}
