//! Logging and metrics bootstrap.

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{EngineConfig, LogFormat};
use crate::error::EngineError;

/// Installs the global tracing subscriber.
///
/// An unparsable `RUST_LOG` directive falls back to `info`.
pub fn init_tracing(config: &EngineConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    }
    .map_err(|e| EngineError::Telemetry(e.to_string()))
}

/// Installs the Prometheus recorder with an HTTP listener on `METRICS_ADDR`.
///
/// Returns `false` without installing anything when no address is configured;
/// metrics calls are then no-ops. Must be called from within a Tokio runtime.
pub fn install_metrics(config: &EngineConfig) -> Result<bool, EngineError> {
    let Some(addr) = config.metrics_addr else {
        return Ok(false);
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| EngineError::Telemetry(e.to_string()))?;
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(true)
}
