//! # Rumor Service
//!
//! Connects the name index and status waiters to the mesh.
//!
//! - `mongering`: rumor ingest, status handling, the mongering loop
//! - `private`: point-to-point messages routed by name
//! - `simple`: the legacy broadcast mode
//! - `tickers`: anti-entropy and route rumors

mod mongering;
mod private;
mod simple;
mod tickers;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;
use rm_01_peer_routing::{GossipNetwork, PeerRoutingApi};
use shared_types::{PrivateMessage, RumorMessage, StatusPacket};

use crate::domain::{NameIndex, StatusWaiters};

/// Timers of the rumor engine.
#[derive(Debug, Clone)]
pub struct RumorSettings {
    /// How long a monger waits for the status reply.
    pub mongering_timeout: Duration,
    /// Period of the anti-entropy status.
    pub anti_entropy_period: Duration,
    /// Period of route rumors; `None` disables them.
    pub route_rumor_period: Option<Duration>,
}

impl Default for RumorSettings {
    fn default() -> Self {
        Self {
            mongering_timeout: Duration::from_secs(1),
            anti_entropy_period: Duration::from_secs(1),
            route_rumor_period: None,
        }
    }
}

/// The rumor engine of one node.
pub struct RumorService {
    network: Arc<GossipNetwork>,
    names: RwLock<NameIndex>,
    waiters: StatusWaiters,
    settings: RumorSettings,
}

impl RumorService {
    pub fn new(network: Arc<GossipNetwork>, settings: RumorSettings) -> Arc<Self> {
        let names = NameIndex::new(network.name());
        Arc::new(Self {
            network,
            names: RwLock::new(names),
            waiters: StatusWaiters::new(),
            settings,
        })
    }

    pub fn network(&self) -> &Arc<GossipNetwork> {
        &self.network
    }

    pub fn settings(&self) -> &RumorSettings {
        &self.settings
    }

    /// Our current vector clock.
    pub fn vector_clock(&self) -> StatusPacket {
        self.names.read().vector_clock()
    }

    /// Stored rumors from `origin`, route rumors included.
    pub fn rumors_from(&self, origin: &str) -> Vec<RumorMessage> {
        self.names.read().rumors(origin)
    }

    /// Private messages exchanged with `origin`.
    pub fn private_messages_from(&self, origin: &str) -> Vec<PrivateMessage> {
        self.names.read().private_messages(origin).to_vec()
    }

    /// Mongering attempts still registered.
    pub fn pending_mongers(&self) -> usize {
        self.waiters.pending()
    }

    fn flip_coin(&self) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }
}
