//! # Wire Codec
//!
//! Protocol-buffer encoding of [`GossipPacket`]. Field numbers follow the
//! declaration order of each payload, starting at 1; the packet itself is a
//! `oneof` whose tag selects the payload.
//!
//! ```text
//! GossipPacket.payload (oneof)
//!   1 Simple        5 DataRequest    9  TxPublish
//!   2 Rumor         6 DataReply      10 BlockPublish
//!   3 Status        7 SearchRequest  11 BlockRequest
//!   4 Private       8 SearchReply    12 BlockReply
//! ```
//!
//! Integers are varints except `File.size` (zig-zag). Hashes and signatures
//! travel as raw bytes and are length-checked on decode.

use prost::Message;

use crate::entities::*;
use crate::errors::{CodecError, Result};
use crate::protocol::{MAX_PACKET_SIZE, SIGNATURE_SIZE};
use crate::Hash;

// =============================================================================
// WIRE MESSAGES
// =============================================================================

#[derive(Clone, PartialEq, Message)]
pub struct WireSimpleMessage {
    #[prost(string, tag = "1")]
    pub original_name: String,
    #[prost(string, tag = "2")]
    pub relay_peer_addr: String,
    #[prost(string, tag = "3")]
    pub contents: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireRumorMessage {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(uint32, tag = "2")]
    pub id: u32,
    #[prost(string, tag = "3")]
    pub text: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct WirePeerStatus {
    #[prost(string, tag = "1")]
    pub identifier: String,
    #[prost(uint32, tag = "2")]
    pub next_id: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireStatusPacket {
    #[prost(message, repeated, tag = "1")]
    pub want: Vec<WirePeerStatus>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WirePrivateMessage {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(uint32, tag = "2")]
    pub id: u32,
    #[prost(string, tag = "3")]
    pub text: String,
    #[prost(string, tag = "4")]
    pub destination: String,
    #[prost(uint32, tag = "5")]
    pub hop_limit: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireDataRequest {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(string, tag = "2")]
    pub destination: String,
    #[prost(uint32, tag = "3")]
    pub hop_limit: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub hash_value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireDataReply {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(string, tag = "2")]
    pub destination: String,
    #[prost(uint32, tag = "3")]
    pub hop_limit: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub hash_value: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireSearchRequest {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(uint64, tag = "2")]
    pub budget: u64,
    #[prost(string, repeated, tag = "3")]
    pub keywords: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireSearchResult {
    #[prost(string, tag = "1")]
    pub file_name: String,
    #[prost(bytes = "vec", tag = "2")]
    pub metafile_hash: Vec<u8>,
    #[prost(uint64, repeated, tag = "3")]
    pub chunk_map: Vec<u64>,
    #[prost(uint64, tag = "4")]
    pub chunk_count: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireSearchReply {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(string, tag = "2")]
    pub destination: String,
    #[prost(uint32, tag = "3")]
    pub hop_limit: u32,
    #[prost(message, repeated, tag = "4")]
    pub results: Vec<WireSearchResult>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireFile {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(sint64, tag = "2")]
    pub size: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub metafile_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireTransaction {
    #[prost(bytes = "vec", tag = "1")]
    pub signature: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub file: Option<WireFile>,
    #[prost(bytes = "vec", tag = "3")]
    pub public_key: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireTxPublish {
    #[prost(message, optional, tag = "1")]
    pub transaction: Option<WireTransaction>,
    #[prost(uint32, tag = "2")]
    pub hop_limit: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireBlock {
    #[prost(bytes = "vec", tag = "1")]
    pub prev_hash: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub nonce: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    pub transactions: Vec<WireTransaction>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireBlockPublish {
    #[prost(message, optional, tag = "1")]
    pub block: Option<WireBlock>,
    #[prost(uint32, tag = "2")]
    pub hop_limit: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireBlockRequest {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub block_hashes: Vec<Vec<u8>>,
    #[prost(uint64, tag = "3")]
    pub budget: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireBlockReply {
    #[prost(string, tag = "1")]
    pub origin: String,
    #[prost(string, tag = "2")]
    pub destination: String,
    #[prost(uint32, tag = "3")]
    pub hop_limit: u32,
    #[prost(message, repeated, tag = "4")]
    pub blocks: Vec<WireBlock>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum WirePayload {
    #[prost(message, tag = "1")]
    Simple(WireSimpleMessage),
    #[prost(message, tag = "2")]
    Rumor(WireRumorMessage),
    #[prost(message, tag = "3")]
    Status(WireStatusPacket),
    #[prost(message, tag = "4")]
    Private(WirePrivateMessage),
    #[prost(message, tag = "5")]
    DataRequest(WireDataRequest),
    #[prost(message, tag = "6")]
    DataReply(WireDataReply),
    #[prost(message, tag = "7")]
    SearchRequest(WireSearchRequest),
    #[prost(message, tag = "8")]
    SearchReply(WireSearchReply),
    #[prost(message, tag = "9")]
    TxPublish(WireTxPublish),
    #[prost(message, tag = "10")]
    BlockPublish(WireBlockPublish),
    #[prost(message, tag = "11")]
    BlockRequest(WireBlockRequest),
    #[prost(message, tag = "12")]
    BlockReply(WireBlockReply),
}

#[derive(Clone, PartialEq, Message)]
pub struct WirePacket {
    #[prost(oneof = "WirePayload", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12")]
    pub payload: Option<WirePayload>,
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Encode a packet for one datagram of at most [`MAX_PACKET_SIZE`] bytes.
pub fn encode_packet(packet: &GossipPacket) -> Result<Vec<u8>> {
    encode_packet_with_limit(packet, MAX_PACKET_SIZE)
}

/// Encode a packet, refusing results larger than `limit`.
pub fn encode_packet_with_limit(packet: &GossipPacket, limit: usize) -> Result<Vec<u8>> {
    let wire = WirePacket {
        payload: Some(to_wire(packet)),
    };
    let size = wire.encoded_len();
    if size > limit {
        return Err(CodecError::TooLarge { size, limit });
    }
    Ok(wire.encode_to_vec())
}

/// Decode one datagram.
pub fn decode_packet(bytes: &[u8]) -> Result<GossipPacket> {
    let wire = WirePacket::decode(bytes)?;
    let payload = wire.payload.ok_or(CodecError::EmptyPacket)?;
    from_wire(payload)
}

// =============================================================================
// DOMAIN -> WIRE
// =============================================================================

fn to_wire(packet: &GossipPacket) -> WirePayload {
    match packet {
        GossipPacket::Simple(m) => WirePayload::Simple(WireSimpleMessage {
            original_name: m.original_name.clone(),
            relay_peer_addr: m.relay_peer_addr.clone(),
            contents: m.contents.clone(),
        }),
        GossipPacket::Rumor(m) => WirePayload::Rumor(WireRumorMessage {
            origin: m.origin.clone(),
            id: m.id,
            text: m.text.clone(),
        }),
        GossipPacket::Status(s) => WirePayload::Status(WireStatusPacket {
            want: s
                .want
                .iter()
                .map(|p| WirePeerStatus {
                    identifier: p.identifier.clone(),
                    next_id: p.next_id,
                })
                .collect(),
        }),
        GossipPacket::Private(m) => WirePayload::Private(WirePrivateMessage {
            origin: m.origin.clone(),
            id: m.id,
            text: m.text.clone(),
            destination: m.destination.clone(),
            hop_limit: m.hop_limit,
        }),
        GossipPacket::DataRequest(r) => WirePayload::DataRequest(WireDataRequest {
            origin: r.origin.clone(),
            destination: r.destination.clone(),
            hop_limit: r.hop_limit,
            hash_value: r.hash_value.to_vec(),
        }),
        GossipPacket::DataReply(r) => WirePayload::DataReply(WireDataReply {
            origin: r.origin.clone(),
            destination: r.destination.clone(),
            hop_limit: r.hop_limit,
            hash_value: r.hash_value.to_vec(),
            data: r.data.clone(),
        }),
        GossipPacket::SearchRequest(r) => WirePayload::SearchRequest(WireSearchRequest {
            origin: r.origin.clone(),
            budget: r.budget,
            keywords: r.keywords.clone(),
        }),
        GossipPacket::SearchReply(r) => WirePayload::SearchReply(WireSearchReply {
            origin: r.origin.clone(),
            destination: r.destination.clone(),
            hop_limit: r.hop_limit,
            results: r
                .results
                .iter()
                .map(|res| WireSearchResult {
                    file_name: res.file_name.clone(),
                    metafile_hash: res.metafile_hash.to_vec(),
                    chunk_map: res.chunk_map.clone(),
                    chunk_count: res.chunk_count,
                })
                .collect(),
        }),
        GossipPacket::TxPublish(p) => WirePayload::TxPublish(WireTxPublish {
            transaction: Some(tx_to_wire(&p.transaction)),
            hop_limit: p.hop_limit,
        }),
        GossipPacket::BlockPublish(p) => WirePayload::BlockPublish(WireBlockPublish {
            block: Some(block_to_wire(&p.block)),
            hop_limit: p.hop_limit,
        }),
        GossipPacket::BlockRequest(r) => WirePayload::BlockRequest(WireBlockRequest {
            origin: r.origin.clone(),
            block_hashes: r.block_hashes.iter().map(|h| h.to_vec()).collect(),
            budget: r.budget,
        }),
        GossipPacket::BlockReply(r) => WirePayload::BlockReply(WireBlockReply {
            origin: r.origin.clone(),
            destination: r.destination.clone(),
            hop_limit: r.hop_limit,
            blocks: r.blocks.iter().map(block_to_wire).collect(),
        }),
    }
}

fn tx_to_wire(tx: &Transaction) -> WireTransaction {
    WireTransaction {
        signature: tx.signature.0.to_vec(),
        file: Some(WireFile {
            name: tx.file.name.clone(),
            size: tx.file.size,
            metafile_hash: tx.file.metafile_hash.to_vec(),
        }),
        public_key: tx.public_key.clone(),
    }
}

fn block_to_wire(block: &Block) -> WireBlock {
    WireBlock {
        prev_hash: block.prev_hash.to_vec(),
        nonce: block.nonce.to_vec(),
        transactions: block.transactions.iter().map(tx_to_wire).collect(),
    }
}

// =============================================================================
// WIRE -> DOMAIN
// =============================================================================

fn fixed_hash(field: &'static str, bytes: &[u8]) -> Result<Hash> {
    bytes.try_into().map_err(|_| CodecError::InvalidLength {
        field,
        expected: 32,
        actual: bytes.len(),
    })
}

fn from_wire(payload: WirePayload) -> Result<GossipPacket> {
    let packet = match payload {
        WirePayload::Simple(m) => GossipPacket::Simple(SimpleMessage {
            original_name: m.original_name,
            relay_peer_addr: m.relay_peer_addr,
            contents: m.contents,
        }),
        WirePayload::Rumor(m) => GossipPacket::Rumor(RumorMessage {
            origin: m.origin,
            id: m.id,
            text: m.text,
        }),
        WirePayload::Status(s) => GossipPacket::Status(StatusPacket {
            want: s
                .want
                .into_iter()
                .map(|p| PeerStatus {
                    identifier: p.identifier,
                    next_id: p.next_id,
                })
                .collect(),
        }),
        WirePayload::Private(m) => GossipPacket::Private(PrivateMessage {
            origin: m.origin,
            id: m.id,
            text: m.text,
            destination: m.destination,
            hop_limit: m.hop_limit,
        }),
        WirePayload::DataRequest(r) => GossipPacket::DataRequest(DataRequest {
            hash_value: fixed_hash("hash_value", &r.hash_value)?,
            origin: r.origin,
            destination: r.destination,
            hop_limit: r.hop_limit,
        }),
        WirePayload::DataReply(r) => GossipPacket::DataReply(DataReply {
            hash_value: fixed_hash("hash_value", &r.hash_value)?,
            origin: r.origin,
            destination: r.destination,
            hop_limit: r.hop_limit,
            data: r.data,
        }),
        WirePayload::SearchRequest(r) => GossipPacket::SearchRequest(SearchRequest {
            origin: r.origin,
            budget: r.budget,
            keywords: r.keywords,
        }),
        WirePayload::SearchReply(r) => {
            let results = r
                .results
                .into_iter()
                .map(|res| {
                    Ok(SearchResult {
                        metafile_hash: fixed_hash("metafile_hash", &res.metafile_hash)?,
                        file_name: res.file_name,
                        chunk_map: res.chunk_map,
                        chunk_count: res.chunk_count,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            GossipPacket::SearchReply(SearchReply {
                origin: r.origin,
                destination: r.destination,
                hop_limit: r.hop_limit,
                results,
            })
        }
        WirePayload::TxPublish(p) => GossipPacket::TxPublish(TxPublish {
            transaction: tx_from_wire(p.transaction.ok_or(CodecError::MissingField("transaction"))?)?,
            hop_limit: p.hop_limit,
        }),
        WirePayload::BlockPublish(p) => GossipPacket::BlockPublish(BlockPublish {
            block: block_from_wire(p.block.ok_or(CodecError::MissingField("block"))?)?,
            hop_limit: p.hop_limit,
        }),
        WirePayload::BlockRequest(r) => GossipPacket::BlockRequest(BlockRequest {
            origin: r.origin,
            block_hashes: r
                .block_hashes
                .iter()
                .map(|h| fixed_hash("block_hashes", h))
                .collect::<Result<Vec<_>>>()?,
            budget: r.budget,
        }),
        WirePayload::BlockReply(r) => GossipPacket::BlockReply(BlockReply {
            origin: r.origin,
            destination: r.destination,
            hop_limit: r.hop_limit,
            blocks: r
                .blocks
                .into_iter()
                .map(block_from_wire)
                .collect::<Result<Vec<_>>>()?,
        }),
    };
    Ok(packet)
}

fn tx_from_wire(wire: WireTransaction) -> Result<Transaction> {
    if wire.signature.len() != SIGNATURE_SIZE {
        return Err(CodecError::InvalidLength {
            field: "signature",
            expected: SIGNATURE_SIZE,
            actual: wire.signature.len(),
        });
    }
    let file = wire.file.ok_or(CodecError::MissingField("file"))?;
    Ok(Transaction {
        signature: Signature::from_slice(&wire.signature).ok_or(CodecError::InvalidLength {
            field: "signature",
            expected: SIGNATURE_SIZE,
            actual: wire.signature.len(),
        })?,
        file: FileRecord {
            metafile_hash: fixed_hash("metafile_hash", &file.metafile_hash)?,
            name: file.name,
            size: file.size,
        },
        public_key: wire.public_key,
    })
}

fn block_from_wire(wire: WireBlock) -> Result<Block> {
    Ok(Block {
        prev_hash: fixed_hash("prev_hash", &wire.prev_hash)?,
        nonce: fixed_hash("nonce", &wire.nonce)?,
        transactions: wire
            .transactions
            .into_iter()
            .map(tx_from_wire)
            .collect::<Result<Vec<_>>>()?,
    })
}
