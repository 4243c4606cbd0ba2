//! # Block Tree
//!
//! Every known block, the fork heads, the active head and the builder of
//! the next block.
//!
//! ## Fork Choice
//!
//! The active head is the tip of the longest known branch; ties keep the
//! first seen. When a longer branch appears the builder moves on top of it
//! and takes back the transactions of the abandoned blocks that are still
//! valid there.
//!
//! ```text
//!   a1 ── a2                 (old head, length 2)
//!   b1 ── b2 ── b3           (new head, length 3)
//!   find_merge(b3, a2) → no common ancestor, rewind a2 and a1
//! ```
//!
//! Blocks whose parent is unknown wait in the pending pool and are retried
//! whenever another block attaches. The pool is bounded; when full, the
//! block that has waited longest is dropped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shared_types::{hash_to_hex, leading_zero_bytes_ok, Block, Hash, Transaction};
use tracing::debug;

use super::{BlockBuilder, ChainBlock, ChainError, MiningTemplate, Result, TxVerdict};

/// Default bound of the pending pool.
pub const MAX_PENDING_BLOCKS: usize = 256;

/// Where two branches meet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Merge {
    /// Last block shared by both branches, `None` when they share no root.
    pub ancestor: Option<Hash>,
    /// Blocks of the old branch strictly above the ancestor.
    pub rewound_blocks: usize,
    /// Their transactions, oldest first.
    pub rewound: Vec<Transaction>,
    /// Transactions of the new branch above the ancestor, oldest first.
    pub applied: Vec<Transaction>,
}

/// Compare the branch ending at `new_head` with the one ending at
/// `old_head`.
pub fn find_merge(new_head: &ChainBlock, old_head: Option<&ChainBlock>) -> Merge {
    let new_branch: HashSet<Hash> = new_head.ancestors().map(ChainBlock::hash).collect();

    let mut ancestor = None;
    let mut old_blocks = Vec::new();
    for block in old_head.into_iter().flat_map(ChainBlock::ancestors) {
        if new_branch.contains(&block.hash()) {
            ancestor = Some(block.hash());
            break;
        }
        old_blocks.push(block);
    }
    let new_blocks: Vec<&ChainBlock> = new_head
        .ancestors()
        .take_while(|block| Some(block.hash()) != ancestor)
        .collect();

    let oldest_first = |blocks: &[&ChainBlock]| -> Vec<Transaction> {
        blocks
            .iter()
            .rev()
            .flat_map(|block| block.transactions().iter().cloned())
            .collect()
    };
    Merge {
        ancestor,
        rewound_blocks: old_blocks.len(),
        rewound: oldest_first(&old_blocks),
        applied: oldest_first(&new_blocks),
    }
}

/// What attaching one block did.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// `head` is the new active head.
    HeadChanged { head: Arc<ChainBlock>, merge: Merge },
    /// The block attached to a branch that is not longer than the active one.
    ShorterFork { block: Hash, ancestor: Option<Hash> },
}

#[derive(Debug, Clone)]
pub enum AddOutcome {
    /// Already attached or waiting.
    Known,
    /// Waiting for its parent.
    Pending { missing: Hash },
    /// Attached, with every pending block it unlocked.
    Attached(Vec<ChainEvent>),
}

pub struct Blockchain {
    zero_bytes: usize,
    blocks: HashMap<Hash, Arc<ChainBlock>>,
    fork_heads: HashSet<Hash>,
    /// Orphans with their arrival number.
    pending: HashMap<Hash, (u64, Block)>,
    pending_seq: u64,
    pending_limit: usize,
    head: Option<Arc<ChainBlock>>,
    builder: BlockBuilder,
}

impl Blockchain {
    /// An empty tree requiring `zero_bytes` leading zero bytes per block.
    pub fn new(zero_bytes: usize) -> Self {
        Self {
            zero_bytes,
            blocks: HashMap::new(),
            fork_heads: HashSet::new(),
            pending: HashMap::new(),
            pending_seq: 0,
            pending_limit: MAX_PENDING_BLOCKS,
            head: None,
            builder: BlockBuilder::new(None),
        }
    }

    /// Keep at most `limit` blocks waiting for their parent.
    pub fn with_pending_limit(mut self, limit: usize) -> Self {
        self.pending_limit = limit.max(1);
        self
    }

    pub fn zero_bytes(&self) -> usize {
        self.zero_bytes
    }

    pub fn head(&self) -> Option<&Arc<ChainBlock>> {
        self.head.as_ref()
    }

    /// Length of the active branch, 0 when empty.
    pub fn length(&self) -> u64 {
        self.head.as_ref().map_or(0, |head| head.length())
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn block(&self, hash: &Hash) -> Option<&Arc<ChainBlock>> {
        self.blocks.get(hash)
    }

    pub fn fork_head_count(&self) -> usize {
        self.fork_heads.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Parents nobody has sent yet.
    pub fn missing_parents(&self) -> Vec<Hash> {
        let mut missing: Vec<Hash> = self
            .pending
            .values()
            .map(|(_, block)| block.prev_hash)
            .filter(|parent| !self.blocks.contains_key(parent) && !self.pending.contains_key(parent))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    pub fn builder(&self) -> &BlockBuilder {
        &self.builder
    }

    /// Transactions of the active branch, oldest first.
    pub fn active_transactions(&self) -> Vec<Transaction> {
        let blocks: Vec<&ChainBlock> = self
            .head
            .as_deref()
            .into_iter()
            .flat_map(ChainBlock::ancestors)
            .collect();
        blocks
            .iter()
            .rev()
            .flat_map(|block| block.transactions().iter().cloned())
            .collect()
    }

    /// Offer a transaction to the builder.
    pub fn add_transaction(&mut self, tx: Transaction) -> TxVerdict {
        self.builder.add_if_valid(tx)
    }

    /// Snapshot of the builder to mine on, if it has anything to seal.
    pub fn mining_template(&self) -> Option<MiningTemplate> {
        if self.builder.is_empty() {
            return None;
        }
        Some(MiningTemplate::new(&self.builder, self.zero_bytes))
    }

    pub fn add_block(&mut self, block: Block) -> Result<AddOutcome> {
        let hash = block.hash();
        if self.blocks.contains_key(&hash) || self.pending.contains_key(&hash) {
            return Ok(AddOutcome::Known);
        }
        if !leading_zero_bytes_ok(&hash, self.zero_bytes) {
            return Err(ChainError::InsufficientWork(hash_to_hex(&hash)));
        }
        if !block.is_genesis() && !self.blocks.contains_key(&block.prev_hash) {
            let missing = block.prev_hash;
            self.stash(hash, block);
            return Ok(AddOutcome::Pending { missing });
        }

        let mut events = vec![self.attach(block)?];
        let mut attached = vec![hash];
        while let Some(parent) = attached.pop() {
            let children: Vec<Hash> = self
                .pending
                .iter()
                .filter(|(_, (_, block))| block.prev_hash == parent)
                .map(|(hash, _)| *hash)
                .collect();
            for child in children {
                let Some((_, block)) = self.pending.remove(&child) else {
                    continue;
                };
                match self.attach(block) {
                    Ok(event) => {
                        events.push(event);
                        attached.push(child);
                    }
                    Err(e) => debug!("pending block {} dropped: {}", hash_to_hex(&child), e),
                }
            }
        }
        Ok(AddOutcome::Attached(events))
    }

    fn stash(&mut self, hash: Hash, block: Block) {
        while self.pending.len() >= self.pending_limit {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|(_, (seq, _))| *seq)
                .map(|(hash, _)| *hash);
            let Some(oldest) = oldest else {
                break;
            };
            debug!("pending pool full, dropping {}", hash_to_hex(&oldest));
            self.pending.remove(&oldest);
        }
        self.pending_seq += 1;
        self.pending.insert(hash, (self.pending_seq, block));
    }

    /// Attach a block whose parent is known or which is a root.
    fn attach(&mut self, block: Block) -> Result<ChainEvent> {
        let parent = if block.is_genesis() {
            None
        } else {
            self.blocks.get(&block.prev_hash).cloned()
        };

        let mut validator = BlockBuilder::new(parent.clone());
        for tx in &block.transactions {
            if !validator.add_if_valid(tx.clone()).is_accepted() {
                return Err(ChainError::ConflictingTransactions {
                    block: hash_to_hex(&block.hash()),
                    file: tx.file.name.clone(),
                });
            }
        }

        let block = Arc::new(ChainBlock::new(block, parent));
        let hash = block.hash();
        self.blocks.insert(hash, Arc::clone(&block));
        self.fork_heads.remove(&block.prev_hash());
        self.fork_heads.insert(hash);

        if block.length() <= self.length() {
            let merge = find_merge(&block, self.head.as_deref());
            return Ok(ChainEvent::ShorterFork {
                block: hash,
                ancestor: merge.ancestor,
            });
        }

        let merge = find_merge(&block, self.head.as_deref());
        let mut builder = BlockBuilder::new(Some(Arc::clone(&block)));
        for tx in merge.rewound.iter().chain(self.builder.transactions()) {
            builder.add_if_valid(tx.clone());
        }
        self.builder = builder;
        self.head = Some(Arc::clone(&block));
        Ok(ChainEvent::HeadChanged { head: block, merge })
    }
}
