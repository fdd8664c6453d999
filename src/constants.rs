// Shared constants for the gateway: forwarded header names, the streaming
// resource table, and configuration defaults.

/// Inbound headers forwarded verbatim to upstreams. Everything else is
/// dropped at the rewrite boundary.
pub const FORWARDED_HEADERS: [&str; 5] = [
    "authorization",
    "x-tenant-id",
    "cookie",
    "accept",
    "content-type",
];

/// Header carrying the service credential on every outbound call.
pub const SERVICE_CREDENTIAL_HEADER: &str = "x-api-key";

/// Header carrying the tenant identifier.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// First path segments owned by the streaming backend besides `threads`
/// run/history subpaths.
pub const STREAMING_RESOURCES: [&str; 5] =
    ["assistants", "deployments", "runs", "schemas", "assets"];

/// Default per-request deadline: 10 minutes, to tolerate long SSE runs.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 600_000;

/// Cushion added on top of the request deadline for the transport-level
/// timeout, so the deadline fires first.
pub const TRANSPORT_TIMEOUT_CUSHION_MS: u64 = 120_000;

/// Default connect timeout for outbound dials.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 60_000;

/// Default bound on idle pooled connections per upstream host.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Default activity log rotation threshold (10 MiB).
pub const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of rotated activity log generations to keep.
pub const DEFAULT_LOG_BACKUPS: usize = 1;
