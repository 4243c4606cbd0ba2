//! # Driving Ports (Inbound API)
//!
//! What the rumor, file and chain subsystems need from the mesh.

use std::net::SocketAddr;

use shared_types::GossipPacket;

use crate::domain::{Routed, RouteUpdate, RoutingError};

/// Neighbor, routing and send operations shared by every subsystem.
pub trait PeerRoutingApi: Send + Sync {
    /// Our origin name.
    fn name(&self) -> &str;

    /// Our gossip endpoint.
    fn local_addr(&self) -> SocketAddr;

    /// Add a neighbor. Returns `true` if it was new.
    fn add_peer(&self, addr: SocketAddr) -> bool;

    /// Every neighbor.
    fn peers(&self) -> Vec<SocketAddr>;

    /// One neighbor chosen uniformly at random, never `exclude`.
    fn random_neighbor(&self, exclude: Option<SocketAddr>) -> Option<SocketAddr>;

    /// Up to `n` distinct random neighbors, never `exclude`.
    fn random_neighbors(&self, n: usize, exclude: Option<SocketAddr>) -> Vec<SocketAddr>;

    /// Encode and send `packet` to one endpoint.
    fn send(&self, packet: &GossipPacket, to: SocketAddr) -> Result<(), RoutingError>;

    /// Send `packet` to every neighbor except `exclude`. Returns the number
    /// of datagrams sent.
    fn broadcast(&self, packet: &GossipPacket, exclude: Option<SocketAddr>) -> usize;

    /// Next hop toward `origin`.
    fn target(&self, origin: &str) -> Option<SocketAddr>;

    /// Route update from an in-sequence rumor.
    fn update_route_from_rumor(&self, origin: &str, id: u32, from: SocketAddr) -> RouteUpdate;

    /// Route learned from private, data or search traffic.
    fn learn_route(&self, origin: &str, from: SocketAddr) -> RouteUpdate;
}

/// Routed send, kept off [`PeerRoutingApi`] so that trait stays object safe.
pub trait RoutedSend {
    /// Spend one hop and forward `message` toward its destination.
    fn send_routed<M: Routed>(&self, message: M) -> Result<SocketAddr, RoutingError>;
}
