//! # File Chain Subsystem
//!
//! A proof-of-work chain binding file names to metahashes and to the RSA
//! key of their owner.
//!
//! ## Blocks
//!
//! ```text
//! hash = sha256( prev_hash ‖ nonce ‖ u32le(tx count) ‖ file hash ... )
//! file hash = sha256( u32le(len name) ‖ name ‖ metahash )
//! ```
//!
//! A block is valid when its hash starts with `N` zero bytes (2 by
//! default). A block whose parent is unknown is held back and its parent
//! requested from the neighbors.
//!
//! ## Ownership
//!
//! | Transaction | Accepted when |
//! |-------------|---------------|
//! | First claim of a file | name unused on the branch, signature over the file hash verifies under the claim's key |
//! | Transfer | signed by the current owner over the current claim's signature |
//!
//! ## Fork Choice
//!
//! The longest branch wins; on equal length the first seen stays. Switching
//! branches rewinds to the common ancestor, puts the abandoned claims back
//! into the next block when they still hold, and tells the file subsystem
//! about files that lost their owner.
//!
//! ## Mining
//!
//! The miner snapshots the pending claims, searches nonces on the blocking
//! pool and attaches what it finds. A block mined on an empty chain is
//! announced five seconds late so that peers starting together converge on
//! one genesis.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    find_merge, sign_ownership, transfer_ownership, AddOutcome, BlockBuilder, Blockchain,
    ChainBlock, ChainError, ChainEvent, Merge, MiningTemplate, TxRejection, TxVerdict,
};
pub use ports::{NullOwnershipListener, OwnershipListener};
pub use service::{ChainService, ChainSettings};
