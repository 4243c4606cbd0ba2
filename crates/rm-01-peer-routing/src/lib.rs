//! # Peer & Routing Subsystem
//!
//! Neighbor endpoints, the DSDV-style routing table and the shared gossip
//! socket.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** peer table, routing table, hop-limit accounting
//! - **Ports Layer:** [`ports::GossipTransport`] and [`ports::DatagramSource`]
//!   for the socket, [`ports::PeerRoutingApi`] for the other subsystems
//! - **Service Layer:** [`GossipNetwork`] wires the tables to the transport
//! - **Adapters Layer:** tokio UDP socket, in-memory hub, recording transport
//!
//! ## Routing Rules
//!
//! | Traffic | Effect on `routing[origin]` |
//! |---------|-----------------------------|
//! | Rumor with id above the last routing id | set to the sender (`DSDV` logged on change) |
//! | Private / data / search | set only if no route exists |
//! | Own origin | never routed |
//!
//! Every sender of a routed payload, the originator included, spends one hop
//! before sending; a payload whose hop limit would reach zero is dropped.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rm_01_peer_routing::{
//!     adapters::RecordingTransport, GossipNetwork, NetworkSettings, PeerRoutingApi,
//! };
//! use shared_bus::NullFrontendSink;
//!
//! let transport = Arc::new(RecordingTransport::new("127.0.0.1:5000".parse().unwrap()));
//! let network = GossipNetwork::new(
//!     NetworkSettings::new("A").with_peers(["127.0.0.1:5001".parse().unwrap()]),
//!     transport,
//!     Arc::new(NullFrontendSink),
//! );
//! assert_eq!(network.peers().len(), 1);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    PeerTable, RouteEntry, RouteUpdate, Routed, RoutingError, RoutingTable,
};
pub use ports::{DatagramSource, GossipTransport, NetworkError, PeerRoutingApi, RoutedSend};
pub use service::{GossipNetwork, NetworkSettings};
