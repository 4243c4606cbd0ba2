//! # Protocol Constants
//!
//! Sizes, hop limits and budgets that every node must agree on.

/// Size of a file chunk in bytes.
pub const CHUNK_SIZE: usize = 8192;

/// Size of a SHA-256 hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A metafile must fit in one chunk, which bounds the number of chunks.
pub const MAX_CHUNKS_PER_FILE: usize = CHUNK_SIZE / HASH_SIZE;

/// Largest file that can be indexed (2 MiB).
pub const MAX_FILE_SIZE: usize = CHUNK_SIZE * MAX_CHUNKS_PER_FILE;

/// RSA-2048 signatures are 256 bytes.
pub const SIGNATURE_SIZE: usize = 256;

/// Hop limit for private messages created by the local client.
pub const PRIVATE_HOP_LIMIT: u32 = 16;

/// Hop limit for `DataRequest` and `DataReply`.
pub const DATA_HOP_LIMIT: u32 = 16;

/// Hop limit for `SearchReply`.
pub const SEARCH_REPLY_HOP_LIMIT: u32 = 10;

/// Hop limit for `TxPublish`.
pub const TX_HOP_LIMIT: u32 = 10;

/// Hop limit for `BlockPublish` and `BlockReply`.
pub const BLOCK_HOP_LIMIT: u32 = 20;

/// Budget of a `BlockRequest` flood.
pub const BLOCK_REQUEST_BUDGET: u64 = 20;

/// Initial budget of an expanding search.
pub const SEARCH_INITIAL_BUDGET: u64 = 2;

/// Expanding searches stop once the budget would exceed this value.
pub const SEARCH_MAX_BUDGET: u64 = 32;

/// Number of full matches after which a search is finished.
pub const SEARCH_MATCH_THRESHOLD: usize = 2;

/// Leading zero bytes required in a block hash.
pub const DEFAULT_LEADING_ZERO_BYTES: usize = 2;

/// Receive buffer and encode ceiling for one datagram.
///
/// A `DataReply` carries a full chunk, so the ceiling is two chunks.
pub const MAX_PACKET_SIZE: usize = 2 * CHUNK_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_sizes() {
        assert_eq!(MAX_CHUNKS_PER_FILE, 256);
        assert_eq!(MAX_FILE_SIZE, 2 * 1024 * 1024);
        assert!(MAX_PACKET_SIZE > CHUNK_SIZE);
    }
}
