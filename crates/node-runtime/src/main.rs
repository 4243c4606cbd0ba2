//! # Rumor-Mesh Node
//!
//! ```text
//! rumor-mesh -UIPort=10000 -gossipAddr=127.0.0.1:5000 -name=nodeA \
//!            -peers=127.0.0.1:5001,127.0.0.1:5002 -rtimer=10
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Parse flags and install logging
//! 2. Load or generate the signing key
//! 3. Open the shared and download directories
//! 4. Bind the gossip socket and the client socket on 127.0.0.1
//! 5. Start the runtime, run until Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use mesh_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use node_runtime::cli::Cli;
use node_runtime::{NodeRuntime, SubsystemContainer};
use rm_01_peer_routing::adapters::UdpGossipSocket;
use rm_03_file_sharing::adapters::FsFileStore;
use shared_bus::LoggingFrontendSink;
use shared_crypto::RsaKeyPair;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_env_args();
    let _telemetry = init_telemetry(TelemetryConfig::for_node(&cli.name))
        .context("failed to initialize telemetry")?;
    let config = cli.into_config().context("invalid configuration")?;

    let keypair = match &config.chain.key_file {
        Some(path) => RsaKeyPair::load_or_generate(path)
            .with_context(|| format!("failed to load key {}", path.display()))?,
        None => RsaKeyPair::generate().context("failed to generate a signing key")?,
    };
    info!("public key {}", hex::encode(keypair.public_key_der()));

    let store = FsFileStore::open(&config.files.shared_dir, &config.files.downloads_dir)
        .context("failed to open file directories")?;

    let gossip_addr = config
        .network
        .gossip_addr
        .context("no gossip address configured")?;
    let max_packet_size = config.network.max_packet_size;
    let gossip = UdpGossipSocket::bind(gossip_addr, max_packet_size)
        .await
        .with_context(|| format!("failed to bind gossip socket {gossip_addr}"))?;
    let ui_addr = SocketAddr::from(([127, 0, 0, 1], config.network.ui_port));
    let client = UdpGossipSocket::bind(ui_addr, max_packet_size)
        .await
        .with_context(|| format!("failed to bind client socket {ui_addr}"))?;

    let gossip_source = gossip.receiver();
    let container = Arc::new(SubsystemContainer::new(
        config,
        Arc::new(gossip),
        Arc::new(store),
        Arc::new(LoggingFrontendSink),
        keypair,
    ));

    let runtime = NodeRuntime::new(container);
    runtime.start(gossip_source);
    runtime.start_client(client.receiver());

    info!("listening on {} (client {}), Ctrl+C to stop", gossip_addr, ui_addr);
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    match encode_metrics() {
        Ok(metrics) => debug!("final metrics\n{}", metrics),
        Err(e) => warn!("cannot encode metrics: {}", e),
    }
    Ok(())
}
