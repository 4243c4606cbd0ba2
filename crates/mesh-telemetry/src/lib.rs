//! # Mesh Telemetry
//!
//! Observability for the gossip node.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber with an env filter and either a human
//!   readable or JSON formatter
//! - **Metrics**: Prometheus counters and gauges for every subsystem
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesh_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RM_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `RM_JSON_LOGS` | `false` | JSON formatted logs |
//! | `RM_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, BLOCKS_ACCEPTED, BLOCKS_MINED, CHAIN_LENGTH,
    CHUNKS_DOWNLOADED, CHUNKS_SERVED, PACKETS_DROPPED, PACKETS_RECEIVED, PEERS_KNOWN,
    RUMORS_ACCEPTED, SEARCHES_FORWARDED, STATUSES_RECEIVED, TRANSACTIONS_ACCEPTED,
    TRANSACTIONS_REJECTED,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install the log subscriber and register metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    init_tracing(&config)?;
    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
