//! # Peer Table
//!
//! Neighbor endpoints keyed by their canonical `a.b.c.d:port` string.
//! Iteration follows key order so random choices are reproducible with a
//! seeded RNG.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use rand::seq::SliceRandom;
use rand::Rng;

/// The set of direct neighbors.
#[derive(Debug, Default, Clone)]
pub struct PeerTable {
    peers: BTreeMap<String, SocketAddr>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with bootstrap peers.
    pub fn with_peers(peers: impl IntoIterator<Item = SocketAddr>) -> Self {
        let mut table = Self::new();
        for peer in peers {
            table.add_if_absent(peer);
        }
        table
    }

    /// Insert `addr`. Returns `true` if it was not already present.
    pub fn add_if_absent(&mut self, addr: SocketAddr) -> bool {
        let key = addr.to_string();
        if self.peers.contains_key(&key) {
            return false;
        }
        self.peers.insert(key, addr);
        true
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.peers.contains_key(&addr.to_string())
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Every neighbor, in key order.
    pub fn all(&self) -> Vec<SocketAddr> {
        self.peers.values().copied().collect()
    }

    /// Every neighbor whose canonical string differs from `exclude`.
    pub fn all_except(&self, exclude: &str) -> Vec<SocketAddr> {
        self.peers
            .iter()
            .filter(|(key, _)| key.as_str() != exclude)
            .map(|(_, addr)| *addr)
            .collect()
    }

    fn candidates(&self, exclude: Option<SocketAddr>) -> Vec<SocketAddr> {
        match exclude {
            Some(excluded) => self.all_except(&excluded.to_string()),
            None => self.all(),
        }
    }

    /// One neighbor chosen uniformly, never `exclude`.
    pub fn random_neighbor<R: Rng + ?Sized>(
        &self,
        exclude: Option<SocketAddr>,
        rng: &mut R,
    ) -> Option<SocketAddr> {
        self.candidates(exclude).choose(rng).copied()
    }

    /// Up to `n` distinct neighbors, never `exclude`. All of them if fewer
    /// than `n` remain after exclusion.
    pub fn random_neighbors<R: Rng + ?Sized>(
        &self,
        n: usize,
        exclude: Option<SocketAddr>,
        rng: &mut R,
    ) -> Vec<SocketAddr> {
        let mut candidates = self.candidates(exclude);
        if candidates.len() <= n {
            return candidates;
        }
        candidates.shuffle(rng);
        candidates.truncate(n);
        candidates
    }
}
