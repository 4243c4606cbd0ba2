//! Nonce search for the builder's next block.

use rand::Rng;
use sha2::{Digest, Sha256};
use shared_types::{leading_zero_bytes_ok, Block, Hash, Transaction};

use super::BlockBuilder;

/// A frozen copy of the builder, searched without holding the chain lock.
#[derive(Debug, Clone)]
pub struct MiningTemplate {
    prev_hash: Hash,
    transactions: Vec<Transaction>,
    tx_hashes: Vec<Hash>,
    zero_bytes: usize,
}

impl MiningTemplate {
    pub fn new(builder: &BlockBuilder, zero_bytes: usize) -> Self {
        let transactions = builder.transactions().to_vec();
        Self {
            prev_hash: builder.prev_hash(),
            tx_hashes: transactions.iter().map(Transaction::hash).collect(),
            transactions,
            zero_bytes,
        }
    }

    pub fn prev_hash(&self) -> Hash {
        self.prev_hash
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Same bytes as [`Block::hash`], without rehashing every file.
    pub fn hash_with_nonce(&self, nonce: &Hash) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.prev_hash);
        hasher.update(nonce);
        hasher.update((self.tx_hashes.len() as u32).to_le_bytes());
        for tx_hash in &self.tx_hashes {
            hasher.update(tx_hash);
        }
        hasher.finalize().into()
    }

    /// Try up to `attempts` random nonces.
    pub fn search<R: Rng>(&self, attempts: usize, rng: &mut R) -> Option<Block> {
        let mut nonce = [0u8; 32];
        for _ in 0..attempts {
            rng.fill_bytes(&mut nonce);
            if leading_zero_bytes_ok(&self.hash_with_nonce(&nonce), self.zero_bytes) {
                return Some(Block {
                    prev_hash: self.prev_hash,
                    nonce,
                    transactions: self.transactions.clone(),
                });
            }
        }
        None
    }
}
