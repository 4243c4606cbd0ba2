//! # Shared Types Crate
//!
//! Wire entities, protocol constants and canonical hashes shared by every
//! subsystem of the gossip node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every packet exchanged between nodes is
//!   defined in [`entities`]; subsystems never invent their own wire types.
//! - **One Variant Per Packet**: [`GossipPacket`] is a sum type. A decoded
//!   packet carries exactly one payload, so dispatchers `match` instead of
//!   probing optional fields.
//! - **Bit-Exact Hashes**: [`FileRecord::hash`] and [`Block::hash`] are the
//!   interoperability contract between nodes and never change.
//!
//! ## Layout
//!
//! ```text
//! shared-types/src/
//! ├── entities.rs   # GossipPacket and its payloads, canonical hashes
//! ├── codec.rs      # protobuf wire encoding (prost)
//! ├── protocol.rs   # chunk sizes, hop limits, budgets
//! └── errors.rs     # CodecError
//! ```

pub mod codec;
pub mod entities;
pub mod errors;
pub mod protocol;

pub use codec::{decode_packet, encode_packet, encode_packet_with_limit};
pub use entities::*;
pub use errors::*;
pub use protocol::*;

/// A SHA-256 digest.
pub type Hash = [u8; 32];

/// The all-zero hash, used as the parent of genesis blocks.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Lowercase hex rendering used in every log line that shows a hash.
pub fn hash_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parse a 64-character hex string into a [`Hash`].
pub fn hash_from_hex(text: &str) -> Option<Hash> {
    let bytes = hex::decode(text.trim()).ok()?;
    bytes.try_into().ok()
}

/// Copy a byte slice into a [`Hash`] if it has exactly 32 bytes.
pub fn hash_from_slice(bytes: &[u8]) -> Option<Hash> {
    bytes.try_into().ok()
}
