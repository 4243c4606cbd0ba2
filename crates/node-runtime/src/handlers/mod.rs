//! # Packet Handlers
//!
//! - `gossip`: packets from peers, dispatched by variant to a subsystem
//! - `client`: packets from the local client on the UI port

pub mod client;
pub mod gossip;

use std::net::SocketAddr;

pub use client::{ClientError, ClientHandler};
pub use gossip::GossipDispatcher;

/// Something that consumes raw datagrams from one socket.
pub trait DatagramHandler: Send + Sync {
    fn handle_datagram(&self, bytes: &[u8], from: SocketAddr);
}
