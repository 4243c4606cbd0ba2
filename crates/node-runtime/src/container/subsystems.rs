//! # Subsystem Container
//!
//! Builds every subsystem of a node on top of one gossip transport.
//!
//! ```text
//! GossipNetwork (peers, routes, socket)
//!    ├── RumorService   rumors, statuses, private and simple messages
//!    ├── FileService    indexing, downloads, search
//!    └── ChainService   claims, blocks, miner ──→ FileOwnershipBridge ──→ FileService
//! ```

use std::sync::Arc;

use rm_01_peer_routing::{GossipNetwork, GossipTransport, NetworkSettings};
use rm_02_rumor_mongering::RumorService;
use rm_03_file_sharing::{FileService, FileStore};
use rm_04_file_chain::ChainService;
use shared_bus::FrontendSink;
use shared_crypto::RsaKeyPair;
use tracing::info;

use crate::adapters::FileOwnershipBridge;
use crate::container::config::NodeConfig;

/// Every subsystem of one node, sharing one network.
pub struct SubsystemContainer {
    pub config: NodeConfig,
    pub network: Arc<GossipNetwork>,
    pub rumors: Arc<RumorService>,
    pub files: Arc<FileService>,
    pub chain: Arc<ChainService>,
}

impl SubsystemContainer {
    pub fn new(
        config: NodeConfig,
        transport: Arc<dyn GossipTransport>,
        store: Arc<dyn FileStore>,
        frontend: Arc<dyn FrontendSink>,
        keypair: RsaKeyPair,
    ) -> Self {
        let mut settings = NetworkSettings::new(config.gossip.name.clone())
            .with_peers(config.network.peers.iter().copied());
        settings.max_packet_size = config.network.max_packet_size;
        let network = Arc::new(GossipNetwork::new(settings, transport, frontend));

        let rumors = RumorService::new(Arc::clone(&network), config.rumor_settings());
        let files = FileService::new(Arc::clone(&network), store, config.file_settings());
        let chain = ChainService::new(
            Arc::clone(&network),
            keypair,
            Arc::new(FileOwnershipBridge::new(Arc::clone(&files))),
            config.chain_settings(),
        );
        for (artist, public_key) in &config.chain.subscriptions {
            chain.subscribe(artist, public_key.clone());
        }

        info!(
            name = %config.gossip.name,
            peers = config.network.peers.len(),
            simple = config.gossip.simple,
            "subsystems initialized"
        );
        Self {
            config,
            network,
            rumors,
            files,
            chain,
        }
    }

    pub fn is_simple(&self) -> bool {
        self.config.gossip.simple
    }
}
