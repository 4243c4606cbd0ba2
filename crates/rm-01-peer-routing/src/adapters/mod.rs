//! Adapters Layer - Concrete transports
//!
//! - `udp`: the production tokio UDP socket
//! - `memory`: an in-process hub connecting several nodes, and a recording
//!   transport for unit tests

pub mod memory;
pub mod udp;

pub use memory::{MemoryDatagramSource, MemoryHub, MemoryTransport, RecordingTransport};
pub use udp::{UdpDatagramSource, UdpGossipSocket};
