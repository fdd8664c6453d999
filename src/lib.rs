pub mod constants;
pub mod error;
mod logging;
pub mod models;
pub mod proxy;
pub mod session;

use tracing::{error, info};

async fn start_gateway() -> Result<(), String> {
    let config = models::config::load_gateway_config()
        .map_err(|e| format!("failed_to_load_config: {}", e))?;
    config
        .validate()
        .map_err(|e| format!("configuration_validation_failed: {}", e))?;

    info!("Starting gateway on {}:{}", config.host, config.port);
    match (
        config.upstream.streaming_base.as_deref(),
        config.upstream.record_base.as_deref(),
    ) {
        (Some(stream), Some(record)) => {
            info!("Streaming backend: {} | Record backend: {}", stream, record)
        }
        (Some(stream), None) => info!(
            "Streaming backend: {} (record traffic falls back to it)",
            stream
        ),
        (None, Some(record)) => info!(
            "Record backend: {} (streaming traffic falls back to it)",
            record
        ),
        (None, None) => unreachable!("rejected by validation"),
    }

    let (_addr, _handle) = proxy::start_server(config).await?;
    Ok(())
}

pub fn run() {
    logging::init_logger();

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    runtime.block_on(async {
        if let Err(e) = start_gateway().await {
            error!("{}", e);
            std::process::exit(1);
        }

        info!("Gateway is running. Press Ctrl+C to exit.");
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down gateway");
    });
}
