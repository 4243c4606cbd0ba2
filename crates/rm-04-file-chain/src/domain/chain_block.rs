//! Sealed blocks linked to their parent.

use std::sync::Arc;

use shared_types::{hash_to_hex, Block, Hash, Transaction, ZERO_HASH};

/// A block attached to the block tree. Immutable once built.
#[derive(Debug)]
pub struct ChainBlock {
    block: Block,
    hash: Hash,
    /// 1 for a root, parent + 1 otherwise.
    length: u64,
    parent: Option<Arc<ChainBlock>>,
}

impl ChainBlock {
    pub(crate) fn new(block: Block, parent: Option<Arc<ChainBlock>>) -> Self {
        let length = parent.as_ref().map_or(1, |p| p.length + 1);
        Self {
            hash: block.hash(),
            block,
            length,
            parent,
        }
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.block.transactions
    }

    pub fn parent(&self) -> Option<&Arc<ChainBlock>> {
        self.parent.as_ref()
    }

    pub fn prev_hash(&self) -> Hash {
        self.parent.as_ref().map_or(ZERO_HASH, |p| p.hash)
    }

    /// This block, then its parent, back to the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// `hash:prev:names`.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self
            .transactions()
            .iter()
            .map(|tx| tx.file.name.as_str())
            .collect();
        format!(
            "{}:{}:{}",
            hash_to_hex(&self.hash),
            hash_to_hex(&self.prev_hash()),
            names.join(",")
        )
    }

    /// `CHAIN` line from this block back to the root.
    pub fn chain_string(&self) -> String {
        let blocks: Vec<String> = self.ancestors().map(ChainBlock::summary).collect();
        format!("CHAIN {}", blocks.join(" "))
    }
}

pub struct Ancestors<'a> {
    next: Option<&'a ChainBlock>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ChainBlock;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}
