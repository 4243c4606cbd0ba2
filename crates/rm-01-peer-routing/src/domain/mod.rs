//! Domain Layer - Pure neighbor and routing logic with no I/O
//!
//! - Peer table: the set of neighbor UDP endpoints
//! - Routing table: origin name → next-hop endpoint
//! - Routed messages: hop-limit accounting shared by every point-to-point
//!   payload

mod errors;
mod peer_table;
mod routed;
mod routing_table;

pub use errors::*;
pub use peer_table::*;
pub use routed::*;
pub use routing_table::*;
