//! # Block Builder
//!
//! The next block on top of a parent, and the ownership view of that
//! parent's branch.
//!
//! ## Ownership Rules
//!
//! - A file (name and metahash) nobody claimed yet may be claimed once its
//!   name is free on the branch. The claim must verify under its own key.
//! - A claimed file changes hands only through a transfer signed by the
//!   current owner over the current claim's signature.
//! - Anything else is ignored: "IGNORING TX: there is already an owner".

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use shared_types::{Block, Hash, Transaction, ZERO_HASH};
use tracing::{debug, info};

use super::{verify_claim, verify_transfer, ChainBlock};

/// Why a transaction was not added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxRejection {
    /// The name or the file belongs to someone else.
    AlreadyOwned,
    /// A first claim that does not verify under its own key.
    BadSignature,
}

impl fmt::Display for TxRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxRejection::AlreadyOwned => f.write_str("there is already an owner"),
            TxRejection::BadSignature => f.write_str("invalid signature"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxVerdict {
    NewOwner,
    OwnerChanged,
    /// Already on the branch or in the builder.
    Duplicate,
    Rejected(TxRejection),
}

impl TxVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TxVerdict::NewOwner | TxVerdict::OwnerChanged)
    }
}

#[derive(Debug, Clone)]
pub struct BlockBuilder {
    parent: Option<Arc<ChainBlock>>,
    length: u64,
    transactions: Vec<Transaction>,
    /// Names used anywhere on the branch or in the builder.
    names: HashSet<String>,
    /// Latest claim per file hash.
    owners: HashMap<Hash, Transaction>,
}

impl BlockBuilder {
    /// An empty builder on top of `parent`, or a root builder.
    pub fn new(parent: Option<Arc<ChainBlock>>) -> Self {
        let mut names = HashSet::new();
        let mut owners = HashMap::new();
        if let Some(parent) = &parent {
            // newest block first, so the first claim seen is the latest
            for block in parent.ancestors() {
                for tx in block.transactions().iter().rev() {
                    names.insert(tx.file.name.clone());
                    owners.entry(tx.hash()).or_insert_with(|| tx.clone());
                }
            }
        }
        Self {
            length: parent.as_ref().map_or(1, |p| p.length() + 1),
            parent,
            transactions: Vec::new(),
            names,
            owners,
        }
    }

    pub fn parent(&self) -> Option<&Arc<ChainBlock>> {
        self.parent.as_ref()
    }

    pub fn prev_hash(&self) -> Hash {
        self.parent.as_ref().map_or(ZERO_HASH, |p| p.hash())
    }

    /// Length the built block will have.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Current claim on the file with hash `file_hash`.
    pub fn owner_of(&self, file_hash: &Hash) -> Option<&Transaction> {
        self.owners.get(file_hash)
    }

    /// Judge `tx` against the branch and the builder without adding it.
    pub fn check(&self, tx: &Transaction) -> TxVerdict {
        match self.owners.get(&tx.hash()) {
            Some(current) if current == tx => TxVerdict::Duplicate,
            Some(current) if verify_transfer(current, tx) => TxVerdict::OwnerChanged,
            Some(_) => TxVerdict::Rejected(TxRejection::AlreadyOwned),
            None if self.names.contains(&tx.file.name) => {
                TxVerdict::Rejected(TxRejection::AlreadyOwned)
            }
            None if !verify_claim(tx) => TxVerdict::Rejected(TxRejection::BadSignature),
            None => TxVerdict::NewOwner,
        }
    }

    /// Add `tx` if it respects the ownership rules.
    pub fn add_if_valid(&mut self, tx: Transaction) -> TxVerdict {
        let verdict = self.check(&tx);
        match verdict {
            TxVerdict::NewOwner => info!("NEW OWNER ({})", tx.file),
            TxVerdict::OwnerChanged => info!("OWNER CHANGED ({})", tx.file),
            TxVerdict::Duplicate => {
                debug!("transaction for {} already known", tx.file.name);
                return verdict;
            }
            TxVerdict::Rejected(reason) => {
                info!("IGNORING TX: {} ({})", reason, tx.file);
                return verdict;
            }
        }
        self.names.insert(tx.file.name.clone());
        self.owners.insert(tx.hash(), tx.clone());
        self.transactions.push(tx);
        verdict
    }

    /// The block this builder would produce with `nonce`.
    pub fn block_with_nonce(&self, nonce: Hash) -> Block {
        Block {
            prev_hash: self.prev_hash(),
            nonce,
            transactions: self.transactions.clone(),
        }
    }
}
