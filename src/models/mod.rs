pub mod config;
pub mod thread;

pub use config::{ActivityLogConfig, GatewayConfig, UpstreamConfig};
pub use thread::{ChatMessage, Role, Thread, ThreadRow};
