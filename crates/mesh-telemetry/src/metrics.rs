//! Prometheus metrics for the gossip node.
//!
//! All metrics follow the naming convention: `rm_<subsystem>_<metric>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    /// Datagrams decoded, by packet kind
    pub static ref PACKETS_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("rm_transport_packets_received_total", "Packets received by kind"),
        &["kind"]
    ).expect("metric creation failed");

    /// Packets dropped, by reason (decode, hop_limit, no_route, loop_stop, ...)
    pub static ref PACKETS_DROPPED: CounterVec = CounterVec::new(
        Opts::new("rm_transport_packets_dropped_total", "Packets dropped by reason"),
        &["reason"]
    ).expect("metric creation failed");

    /// Known neighbor endpoints
    pub static ref PEERS_KNOWN: Gauge = Gauge::new(
        "rm_peers_known",
        "Number of neighbor endpoints in the peer table"
    ).expect("metric creation failed");

    // =========================================================================
    // RUMORS
    // =========================================================================

    /// Rumors appended to the message log
    pub static ref RUMORS_ACCEPTED: Counter = Counter::new(
        "rm_rumor_accepted_total",
        "Rumors accepted in sequence"
    ).expect("metric creation failed");

    /// Status packets received
    pub static ref STATUSES_RECEIVED: Counter = Counter::new(
        "rm_rumor_statuses_received_total",
        "Status packets received"
    ).expect("metric creation failed");

    // =========================================================================
    // FILES
    // =========================================================================

    /// Chunks and metafiles served to other nodes
    pub static ref CHUNKS_SERVED: Counter = Counter::new(
        "rm_files_chunks_served_total",
        "Chunks and metafiles served"
    ).expect("metric creation failed");

    /// Chunks written to downloads
    pub static ref CHUNKS_DOWNLOADED: Counter = Counter::new(
        "rm_files_chunks_downloaded_total",
        "Chunks downloaded and verified"
    ).expect("metric creation failed");

    /// Search requests forwarded to neighbors
    pub static ref SEARCHES_FORWARDED: Counter = Counter::new(
        "rm_files_searches_forwarded_total",
        "Search requests forwarded"
    ).expect("metric creation failed");

    // =========================================================================
    // CHAIN
    // =========================================================================

    /// Transactions accepted into the pending block
    pub static ref TRANSACTIONS_ACCEPTED: Counter = Counter::new(
        "rm_chain_transactions_accepted_total",
        "Transactions accepted into the block builder"
    ).expect("metric creation failed");

    /// Transactions rejected by ownership validation
    pub static ref TRANSACTIONS_REJECTED: Counter = Counter::new(
        "rm_chain_transactions_rejected_total",
        "Transactions rejected by ownership validation"
    ).expect("metric creation failed");

    /// Blocks mined locally
    pub static ref BLOCKS_MINED: Counter = Counter::new(
        "rm_chain_blocks_mined_total",
        "Blocks mined by this node"
    ).expect("metric creation failed");

    /// Blocks attached to the chain
    pub static ref BLOCKS_ACCEPTED: Counter = Counter::new(
        "rm_chain_blocks_accepted_total",
        "Blocks attached to the chain"
    ).expect("metric creation failed");

    /// Length of the active chain
    pub static ref CHAIN_LENGTH: Gauge = Gauge::new(
        "rm_chain_length",
        "Length of the active chain"
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(PACKETS_RECEIVED.clone()),
        Box::new(PACKETS_DROPPED.clone()),
        Box::new(PEERS_KNOWN.clone()),
        Box::new(RUMORS_ACCEPTED.clone()),
        Box::new(STATUSES_RECEIVED.clone()),
        Box::new(CHUNKS_SERVED.clone()),
        Box::new(CHUNKS_DOWNLOADED.clone()),
        Box::new(SEARCHES_FORWARDED.clone()),
        Box::new(TRANSACTIONS_ACCEPTED.clone()),
        Box::new(TRANSACTIONS_REJECTED.clone()),
        Box::new(BLOCKS_MINED.clone()),
        Box::new(BLOCKS_ACCEPTED.clone()),
        Box::new(CHAIN_LENGTH.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_encode() {
        // A second registration in the same process fails, which is fine.
        let _ = register_metrics();
        BLOCKS_MINED.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("rm_chain_blocks_mined_total"));
    }

    #[test]
    fn test_gauge_set() {
        CHAIN_LENGTH.set(4.0);
        assert_eq!(CHAIN_LENGTH.get(), 4.0);
    }
}
