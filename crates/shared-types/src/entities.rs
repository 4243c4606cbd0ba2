//! # Wire Entities
//!
//! Every payload a node can send or receive, plus the canonical hashes that
//! bind files and blocks together.
//!
//! ## Canonical Hashes
//!
//! ```text
//! file  = SHA256( LE_u32(len(name)) || name || metafile_hash )
//! block = SHA256( prev_hash || nonce || LE_u32(tx_count) || file_hash_1 || ... )
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::protocol::SIGNATURE_SIZE;
use crate::{hash_to_hex, Hash, ZERO_HASH};

// =============================================================================
// RUMOR LAYER
// =============================================================================

/// Legacy broadcast payload used in simple mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleMessage {
    /// Name of the node that wrote the message.
    pub original_name: String,
    /// `ip:port` of the last node that relayed it.
    pub relay_peer_addr: String,
    /// Message text.
    pub contents: String,
}

/// A gossip message with a per-origin sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RumorMessage {
    pub origin: String,
    pub id: u32,
    pub text: String,
}

impl RumorMessage {
    pub fn new(origin: impl Into<String>, id: u32, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            id,
            text: text.into(),
        }
    }

    /// Route rumors carry no text and are never shown to users.
    pub fn is_route_rumor(&self) -> bool {
        self.text.is_empty()
    }
}

/// One entry of a vector clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStatus {
    pub identifier: String,
    /// Next id the owner of the clock expects from `identifier`.
    pub next_id: u32,
}

/// A vector clock, sent as an unordered list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPacket {
    pub want: Vec<PeerStatus>,
}

impl StatusPacket {
    /// The advertised `next_id` for `origin`, if the clock mentions it.
    pub fn next_id_for(&self, origin: &str) -> Option<u32> {
        self.want
            .iter()
            .find(|entry| entry.identifier == origin)
            .map(|entry| entry.next_id)
    }
}

/// A point-to-point text message routed by origin name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub origin: String,
    pub id: u32,
    pub text: String,
    pub destination: String,
    pub hop_limit: u32,
}

// =============================================================================
// FILE LAYER
// =============================================================================

/// Ask `destination` for the chunk or metafile whose hash is `hash_value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub origin: String,
    pub destination: String,
    pub hop_limit: u32,
    pub hash_value: Hash,
}

/// Answer to a [`DataRequest`]. `data` hashes to `hash_value` when honest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataReply {
    pub origin: String,
    pub destination: String,
    pub hop_limit: u32,
    pub hash_value: Hash,
    pub data: Vec<u8>,
}

/// Keyword search flooded with a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub origin: String,
    pub budget: u64,
    pub keywords: Vec<String>,
}

/// One file matched by a search at the replying node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub file_name: String,
    pub metafile_hash: Hash,
    /// 1-based indices of the chunks the replying node holds.
    pub chunk_map: Vec<u64>,
    pub chunk_count: u64,
}

impl SearchResult {
    /// The replying node holds every chunk of the file.
    pub fn is_full_match(&self) -> bool {
        self.chunk_map.len() as u64 == self.chunk_count
    }
}

/// Results routed back to the origin of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReply {
    pub origin: String,
    pub destination: String,
    pub hop_limit: u32,
    pub results: Vec<SearchResult>,
}

// =============================================================================
// CHAIN LAYER
// =============================================================================

/// The `(name, size, metahash)` triple a transaction claims ownership of.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRecord {
    pub name: String,
    pub size: i64,
    pub metafile_hash: Hash,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, size: i64, metafile_hash: Hash) -> Self {
        Self {
            name: name.into(),
            size,
            metafile_hash,
        }
    }

    /// Canonical file hash. Also the transaction hash.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update((self.name.len() as u32).to_le_bytes());
        hasher.update(self.name.as_bytes());
        hasher.update(self.metafile_hash);
        hasher.finalize().into()
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FILE named {} size {} with metafile hash {}",
            self.name,
            self.size,
            hash_to_hex(&self.metafile_hash)
        )
    }
}

/// Fixed-size RSA-2048 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

impl Signature {
    /// Copy a signature out of a slice. Shorter input is zero-padded on the right.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > SIGNATURE_SIZE {
            return None;
        }
        let mut out = [0u8; SIGNATURE_SIZE];
        out[..bytes.len()].copy_from_slice(bytes);
        Some(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_SIZE])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hash_to_hex(&self.0[..8]))
    }
}

/// A signed ownership claim. `public_key` is a PKCS#1 DER RSA public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signature: Signature,
    pub file: FileRecord,
    pub public_key: Vec<u8>,
}

impl Transaction {
    /// Transactions are identified by the hash of their file.
    pub fn hash(&self) -> Hash {
        self.file.hash()
    }
}

/// A transaction being flooded through the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPublish {
    pub transaction: Transaction,
    pub hop_limit: u32,
}

/// A sealed block of ownership transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub prev_hash: Hash,
    pub nonce: Hash,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.prev_hash);
        hasher.update(self.nonce);
        hasher.update((self.transactions.len() as u32).to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.file.hash());
        }
        hasher.finalize().into()
    }

    /// A block whose parent hash is all zeroes.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash == ZERO_HASH
    }

    /// Proof of work: the hash starts with `zero_bytes` zero bytes.
    pub fn has_valid_pow(&self, zero_bytes: usize) -> bool {
        leading_zero_bytes_ok(&self.hash(), zero_bytes)
    }

    /// `hash:prev:name1,name2` as printed in CHAIN lines.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self
            .transactions
            .iter()
            .map(|tx| tx.file.name.as_str())
            .collect();
        format!(
            "{}:{}:{}",
            hash_to_hex(&self.hash()),
            hash_to_hex(&self.prev_hash),
            names.join(",")
        )
    }
}

/// True when the first `zero_bytes` bytes of `hash` are zero.
pub fn leading_zero_bytes_ok(hash: &Hash, zero_bytes: usize) -> bool {
    hash.iter().take(zero_bytes).all(|byte| *byte == 0)
}

/// A block being flooded through the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPublish {
    pub block: Block,
    pub hop_limit: u32,
}

/// Request for blocks whose parents are missing locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRequest {
    pub origin: String,
    /// Empty means "send me your current head".
    pub block_hashes: Vec<Hash>,
    pub budget: u64,
}

/// Blocks routed back to the origin of a [`BlockRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReply {
    pub origin: String,
    pub destination: String,
    pub hop_limit: u32,
    pub blocks: Vec<Block>,
}

// =============================================================================
// PACKET
// =============================================================================

/// One datagram. Exactly one payload is present by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GossipPacket {
    Simple(SimpleMessage),
    Rumor(RumorMessage),
    Status(StatusPacket),
    Private(PrivateMessage),
    DataRequest(DataRequest),
    DataReply(DataReply),
    SearchRequest(SearchRequest),
    SearchReply(SearchReply),
    TxPublish(TxPublish),
    BlockPublish(BlockPublish),
    BlockRequest(BlockRequest),
    BlockReply(BlockReply),
}

impl GossipPacket {
    /// Short variant name for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            GossipPacket::Simple(_) => "simple",
            GossipPacket::Rumor(_) => "rumor",
            GossipPacket::Status(_) => "status",
            GossipPacket::Private(_) => "private",
            GossipPacket::DataRequest(_) => "data_request",
            GossipPacket::DataReply(_) => "data_reply",
            GossipPacket::SearchRequest(_) => "search_request",
            GossipPacket::SearchReply(_) => "search_reply",
            GossipPacket::TxPublish(_) => "tx_publish",
            GossipPacket::BlockPublish(_) => "block_publish",
            GossipPacket::BlockRequest(_) => "block_request",
            GossipPacket::BlockReply(_) => "block_reply",
        }
    }
}
