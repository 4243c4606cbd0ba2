//! # Chain Service
//!
//! Connects the block tree to the mesh, the miner and the file subsystem.
//!
//! - `ingest`: transaction and block publishes, chain events
//! - `recovery`: block requests and replies for missing parents
//! - `miner`: the nonce search worker
//! - `subscriptions`: artists whose files are fetched when they publish

mod ingest;
mod miner;
mod recovery;
mod subscriptions;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard};
use rm_01_peer_routing::GossipNetwork;
use shared_crypto::RsaKeyPair;
use shared_types::{Hash, DEFAULT_LEADING_ZERO_BYTES};

use crate::domain::{Blockchain, Subscriptions, MAX_PENDING_BLOCKS};
use crate::ports::OwnershipListener;

#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Leading zero bytes a block hash needs.
    pub leading_zero_bytes: usize,
    /// How long a block mined on an empty chain waits before broadcast.
    pub first_block_delay: Duration,
    /// Miner sleep when there is nothing to seal.
    pub idle_delay: Duration,
    /// Nonces tried per blocking mining batch.
    pub mining_batch: usize,
    /// Orphan blocks kept while their parents are fetched.
    pub max_pending_blocks: usize,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            leading_zero_bytes: DEFAULT_LEADING_ZERO_BYTES,
            first_block_delay: Duration::from_secs(5),
            idle_delay: Duration::from_millis(100),
            mining_batch: 1 << 16,
            max_pending_blocks: MAX_PENDING_BLOCKS,
        }
    }
}

/// The ownership chain of one node.
pub struct ChainService {
    network: Arc<GossipNetwork>,
    chain: RwLock<Blockchain>,
    keypair: RsaKeyPair,
    subscriptions: RwLock<Subscriptions>,
    listener: Arc<dyn OwnershipListener>,
    settings: ChainSettings,
}

impl ChainService {
    pub fn new(
        network: Arc<GossipNetwork>,
        keypair: RsaKeyPair,
        listener: Arc<dyn OwnershipListener>,
        settings: ChainSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            network,
            chain: RwLock::new(
                Blockchain::new(settings.leading_zero_bytes)
                    .with_pending_limit(settings.max_pending_blocks),
            ),
            keypair,
            subscriptions: RwLock::new(Subscriptions::new()),
            listener,
            settings,
        })
    }

    pub fn network(&self) -> &Arc<GossipNetwork> {
        &self.network
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// DER public key this node signs its claims with.
    pub fn public_key(&self) -> &[u8] {
        self.keypair.public_key_der()
    }

    /// Read access to the block tree. Do not hold across an await.
    pub fn chain(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.chain.read()
    }

    pub fn length(&self) -> u64 {
        self.chain.read().length()
    }

    pub fn head_hash(&self) -> Option<Hash> {
        self.chain.read().head().map(|head| head.hash())
    }
}
