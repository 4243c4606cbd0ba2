//! # Gossip Network Service
//!
//! Wires the peer table and routing table to the transport. Every subsystem
//! sends through one shared [`GossipNetwork`].

use std::net::SocketAddr;
use std::sync::Arc;

use mesh_telemetry::{log_peer_event, metric_inc, PACKETS_DROPPED, PEERS_KNOWN};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_bus::FrontendSink;
use shared_types::{encode_packet_with_limit, GossipPacket, MAX_PACKET_SIZE};
use tracing::{debug, info, warn};

use crate::domain::{PeerTable, RouteUpdate, Routed, RoutingError, RoutingTable};
use crate::ports::{GossipTransport, PeerRoutingApi, RoutedSend};

/// Mesh settings.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    /// Our origin name.
    pub name: String,
    /// Bootstrap neighbors.
    pub peers: Vec<SocketAddr>,
    /// Largest datagram we encode.
    pub max_packet_size: usize,
}

impl NetworkSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            peers: Vec::new(),
            max_packet_size: MAX_PACKET_SIZE,
        }
    }

    pub fn with_peers(mut self, peers: impl IntoIterator<Item = SocketAddr>) -> Self {
        self.peers = peers.into_iter().collect();
        self
    }
}

/// The node's view of the mesh.
pub struct GossipNetwork {
    name: String,
    transport: Arc<dyn GossipTransport>,
    peers: RwLock<PeerTable>,
    routes: RwLock<RoutingTable>,
    frontend: Arc<dyn FrontendSink>,
    rng: Mutex<StdRng>,
    max_packet_size: usize,
}

impl GossipNetwork {
    pub fn new(
        settings: NetworkSettings,
        transport: Arc<dyn GossipTransport>,
        frontend: Arc<dyn FrontendSink>,
    ) -> Self {
        let own = transport.local_addr();
        let peers = PeerTable::with_peers(settings.peers.into_iter().filter(|p| *p != own));
        PEERS_KNOWN.set(peers.len() as f64);
        Self {
            routes: RwLock::new(RoutingTable::new(settings.name.clone())),
            name: settings.name,
            transport,
            peers: RwLock::new(peers),
            frontend,
            rng: Mutex::new(StdRng::from_entropy()),
            max_packet_size: settings.max_packet_size,
        }
    }

    /// Make neighbor choices reproducible.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn frontend(&self) -> &Arc<dyn FrontendSink> {
        &self.frontend
    }

    /// Known destinations, sorted.
    pub fn destinations(&self) -> Vec<String> {
        self.routes.read().destinations()
    }

    fn announce_route(&self, origin: &str, update: RouteUpdate) {
        if update == RouteUpdate::Added {
            self.frontend.push_contact(origin);
        }
    }
}

impl PeerRoutingApi for GossipNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    fn add_peer(&self, addr: SocketAddr) -> bool {
        if addr == self.transport.local_addr() {
            return false;
        }
        let added = {
            let mut peers = self.peers.write();
            let added = peers.add_if_absent(addr);
            PEERS_KNOWN.set(peers.len() as f64);
            added
        };
        if added {
            log_peer_event!(debug, "routing", addr, "new neighbor");
            self.frontend.push_peer(addr);
        }
        added
    }

    fn peers(&self) -> Vec<SocketAddr> {
        self.peers.read().all()
    }

    fn random_neighbor(&self, exclude: Option<SocketAddr>) -> Option<SocketAddr> {
        let peers = self.peers.read();
        peers.random_neighbor(exclude, &mut *self.rng.lock())
    }

    fn random_neighbors(&self, n: usize, exclude: Option<SocketAddr>) -> Vec<SocketAddr> {
        let peers = self.peers.read();
        peers.random_neighbors(n, exclude, &mut *self.rng.lock())
    }

    fn send(&self, packet: &GossipPacket, to: SocketAddr) -> Result<(), RoutingError> {
        let bytes = encode_packet_with_limit(packet, self.max_packet_size).map_err(|e| {
            warn!(kind = packet.kind(), error = %e, "dropping packet that cannot be encoded");
            metric_inc!(PACKETS_DROPPED, &["encode"]);
            RoutingError::Encode(e.to_string())
        })?;
        self.transport
            .send_datagram(&bytes, to)
            .map_err(|e| {
                debug!(kind = packet.kind(), target = %to, error = %e, "send failed");
                metric_inc!(PACKETS_DROPPED, &["send"]);
                RoutingError::Send {
                    target: to,
                    reason: e.to_string(),
                }
            })
    }

    fn broadcast(&self, packet: &GossipPacket, exclude: Option<SocketAddr>) -> usize {
        let targets = match exclude {
            Some(excluded) => self.peers.read().all_except(&excluded.to_string()),
            None => self.peers.read().all(),
        };
        targets
            .into_iter()
            .filter(|target| self.send(packet, *target).is_ok())
            .count()
    }

    fn target(&self, origin: &str) -> Option<SocketAddr> {
        self.routes.read().target(origin)
    }

    fn update_route_from_rumor(&self, origin: &str, id: u32, from: SocketAddr) -> RouteUpdate {
        let update = self.routes.write().update_from_rumor(origin, id, from);
        if update.moved() {
            info!("DSDV {} {}", origin, from);
        }
        self.announce_route(origin, update);
        update
    }

    fn learn_route(&self, origin: &str, from: SocketAddr) -> RouteUpdate {
        let update = self.routes.write().add_if_absent(origin, from);
        if update == RouteUpdate::Added {
            debug!(origin, next_hop = %from, "route learned from traffic");
        }
        self.announce_route(origin, update);
        update
    }
}

impl RoutedSend for GossipNetwork {
    fn send_routed<M: Routed>(&self, mut message: M) -> Result<SocketAddr, RoutingError> {
        let destination = message.destination().to_string();
        if !message.spend_hop() {
            debug!(%destination, "hop limit exhausted");
            metric_inc!(PACKETS_DROPPED, &["hop_limit"]);
            return Err(RoutingError::HopLimitExhausted(destination));
        }
        let Some(next_hop) = self.target(&destination) else {
            debug!(%destination, "no route");
            metric_inc!(PACKETS_DROPPED, &["no_route"]);
            return Err(RoutingError::NoRoute(destination));
        };
        self.send(&message.into_packet(), next_hop)?;
        Ok(next_hop)
    }
}
