//! Artists whose published files this node downloads.

use std::collections::{HashMap, HashSet};

use shared_types::{FileRecord, Transaction};

use super::BlockBuilder;

#[derive(Debug, Default, Clone)]
pub struct Subscriptions {
    /// Public key DER to artist name.
    artists: HashMap<Vec<u8>, String>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the key was already followed, under any name.
    pub fn subscribe(&mut self, artist: impl Into<String>, public_key: Vec<u8>) -> bool {
        self.artists.insert(public_key, artist.into()).is_none()
    }

    pub fn artist_of(&self, tx: &Transaction) -> Option<&str> {
        self.artists.get(&tx.public_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    /// Subscribed transactions among `txs`, paired with their artist.
    pub fn matching<'a>(
        &'a self,
        txs: &'a [Transaction],
    ) -> impl Iterator<Item = (&'a Transaction, &'a str)> + 'a {
        txs.iter()
            .filter_map(move |tx| self.artist_of(tx).map(|artist| (tx, artist)))
    }
}

/// Files of `rewound` left without any owner once `builder` is the new
/// view, each once.
pub fn orphaned_files(rewound: &[Transaction], builder: &BlockBuilder) -> Vec<FileRecord> {
    let mut seen = HashSet::new();
    rewound
        .iter()
        .filter(|tx| builder.owner_of(&tx.hash()).is_none())
        .filter(|tx| seen.insert(tx.hash()))
        .map(|tx| tx.file.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sign_ownership;
    use shared_crypto::testing::fixture_keypair;
    use shared_types::FileRecord;

    fn claim(name: &str, key: usize) -> Transaction {
        sign_ownership(FileRecord::new(name, 1, [key as u8; 32]), &fixture_keypair(key)).unwrap()
    }

    #[test]
    fn test_matching_by_public_key() {
        let mut subscriptions = Subscriptions::new();
        assert!(subscriptions.subscribe("Bob", fixture_keypair(1).public_key_der().to_vec()));
        assert!(!subscriptions.subscribe("Robert", fixture_keypair(1).public_key_der().to_vec()));

        let txs = vec![claim("a", 0), claim("b", 1)];
        let matched: Vec<_> = subscriptions.matching(&txs).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].0.file.name, "b");
        assert_eq!(matched[0].1, "Robert");
    }

    #[test]
    fn test_orphaned_files() {
        let kept = claim("kept", 0);
        let lost = claim("lost", 0);
        let mut builder = BlockBuilder::new(None);
        builder.add_if_valid(kept.clone());

        let rewound = vec![kept, lost.clone(), lost.clone()];
        assert_eq!(orphaned_files(&rewound, &builder), vec![lost.file]);
    }
}
