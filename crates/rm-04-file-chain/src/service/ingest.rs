use std::net::SocketAddr;

use mesh_telemetry::{
    log_event, metric_inc, BLOCKS_ACCEPTED, CHAIN_LENGTH, PACKETS_DROPPED, TRANSACTIONS_ACCEPTED,
    TRANSACTIONS_REJECTED,
};
use rm_01_peer_routing::PeerRoutingApi;
use shared_types::{
    hash_to_hex, Block, BlockPublish, FileRecord, GossipPacket, Transaction, TxPublish,
    TX_HOP_LIMIT, ZERO_HASH,
};
use tracing::debug;

use super::ChainService;
use crate::domain::{
    orphaned_files, sign_ownership, AddOutcome, ChainError, ChainEvent, Result, TxVerdict,
};

/// What one call to `add_block` changed, gathered under the chain lock.
struct Ingested {
    outcome: AddOutcome,
    /// Files whose claim was rewound away and not restored.
    orphaned: Vec<FileRecord>,
}

impl ChainService {
    /// Claim `file` for this node and gossip the claim.
    pub fn publish_file(&self, file: FileRecord) -> Result<Transaction> {
        let tx = sign_ownership(file, &self.keypair)?;
        let verdict = self.chain.write().add_transaction(tx.clone());
        match verdict {
            TxVerdict::Rejected(reason) => {
                metric_inc!(TRANSACTIONS_REJECTED);
                return Err(ChainError::TransactionRejected {
                    file: tx.file.name.clone(),
                    reason,
                });
            }
            TxVerdict::Duplicate => return Ok(tx),
            TxVerdict::NewOwner | TxVerdict::OwnerChanged => metric_inc!(TRANSACTIONS_ACCEPTED),
        }
        let packet = GossipPacket::TxPublish(TxPublish {
            transaction: tx.clone(),
            hop_limit: TX_HOP_LIMIT,
        });
        self.network.broadcast(&packet, None);
        Ok(tx)
    }

    /// A transaction gossiped by `from`. Returns `true` when it was new and
    /// valid.
    pub fn on_tx_publish(&self, publish: TxPublish, from: SocketAddr) -> bool {
        let TxPublish {
            transaction,
            hop_limit,
        } = publish;
        let verdict = self.chain.write().add_transaction(transaction.clone());
        match verdict {
            TxVerdict::NewOwner | TxVerdict::OwnerChanged => metric_inc!(TRANSACTIONS_ACCEPTED),
            TxVerdict::Rejected(_) => {
                metric_inc!(TRANSACTIONS_REJECTED);
                return false;
            }
            TxVerdict::Duplicate => return false,
        }
        if hop_limit > 0 {
            let packet = GossipPacket::TxPublish(TxPublish {
                transaction,
                hop_limit: hop_limit - 1,
            });
            self.network.broadcast(&packet, Some(from));
        }
        true
    }

    /// A block gossiped by `from`. Returns `true` when it was new.
    pub fn on_block_publish(&self, publish: BlockPublish, from: SocketAddr) -> bool {
        let BlockPublish { block, hop_limit } = publish;
        match self.ingest_block(block.clone()) {
            Ok(AddOutcome::Known) => return false,
            Ok(_) => {}
            Err(e) => {
                debug!("block from {} dropped: {}", from, e);
                metric_inc!(PACKETS_DROPPED, &["bad_block"]);
                return false;
            }
        }
        if hop_limit > 0 {
            let packet = GossipPacket::BlockPublish(BlockPublish {
                block,
                hop_limit: hop_limit - 1,
            });
            self.network.broadcast(&packet, Some(from));
        }
        true
    }

    /// Add `block` to the tree and act on what changed.
    pub(crate) fn ingest_block(&self, block: Block) -> Result<AddOutcome> {
        let Ingested { outcome, orphaned } = {
            let mut chain = self.chain.write();
            let outcome = chain.add_block(block)?;
            let rewound: Vec<Transaction> = match &outcome {
                AddOutcome::Attached(events) => events
                    .iter()
                    .filter_map(|event| match event {
                        ChainEvent::HeadChanged { merge, .. } => Some(merge.rewound.iter().cloned()),
                        ChainEvent::ShorterFork { .. } => None,
                    })
                    .flatten()
                    .collect(),
                _ => Vec::new(),
            };
            let orphaned = orphaned_files(&rewound, chain.builder());
            Ingested { outcome, orphaned }
        };

        match &outcome {
            AddOutcome::Attached(events) => {
                for event in events {
                    self.on_chain_event(event);
                }
                for file in &orphaned {
                    debug!("claim on {} rewound away", file.name);
                    self.listener.invalidate(&file.metafile_hash);
                }
            }
            AddOutcome::Pending { missing } => {
                debug!("block waits for parent {}", hash_to_hex(missing));
                self.request_missing();
            }
            AddOutcome::Known => {}
        }
        Ok(outcome)
    }

    fn on_chain_event(&self, event: &ChainEvent) {
        metric_inc!(BLOCKS_ACCEPTED);
        match event {
            ChainEvent::HeadChanged { head, merge } => {
                if merge.rewound_blocks > 0 {
                    log_event!(info, "chain", "FORK-LONGER rewind {} blocks", merge.rewound_blocks);
                }
                log_event!(info, "chain", "{}", head.chain_string());
                CHAIN_LENGTH.set(head.length() as f64);
                self.network
                    .frontend()
                    .push_chain_head(&head.hash(), head.length());
                self.fetch_subscribed(&merge.applied);
            }
            ChainEvent::ShorterFork { ancestor, .. } => {
                let ancestor = ancestor.unwrap_or(ZERO_HASH);
                log_event!(info, "chain", "FORK-SHORTER {}", hash_to_hex(&ancestor));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use shared_bus::FrontendUpdate;
    use shared_types::{BlockPublish, TxPublish, BLOCK_HOP_LIMIT};
    use tracing_test::traced_test;

    use super::*;
    use crate::adapters::OwnershipCall;
    use crate::domain::TxRejection;
    use crate::service::testing::{addr, claim, mined, node};

    #[test]
    fn test_publish_file_broadcasts_claim() {
        let a = node("A", 0);
        let tx = a
            .service
            .publish_file(FileRecord::new("song.mp3", 10, [1; 32]))
            .unwrap();

        let sent = a.transport.take_packets();
        assert_eq!(sent.len(), 2);
        for (packet, _) in &sent {
            match packet {
                GossipPacket::TxPublish(publish) => {
                    assert_eq!(publish.hop_limit, TX_HOP_LIMIT);
                    assert_eq!(publish.transaction, tx);
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        // the same claim again is not regossiped
        a.service
            .publish_file(FileRecord::new("song.mp3", 10, [1; 32]))
            .unwrap();
        assert_eq!(a.transport.sent_count(), 0);
    }

    #[test]
    fn test_publish_taken_name_rejected() {
        let a = node("A", 0);
        a.service
            .publish_file(FileRecord::new("song.mp3", 10, [1; 32]))
            .unwrap();
        let err = a
            .service
            .publish_file(FileRecord::new("song.mp3", 10, [2; 32]))
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::TransactionRejected {
                file: "song.mp3".into(),
                reason: TxRejection::AlreadyOwned,
            }
        );
    }

    #[test]
    fn test_tx_rebroadcast_excludes_sender() {
        let a = node("A", 0);
        let publish = TxPublish {
            transaction: claim("a.txt", 1, 1),
            hop_limit: 10,
        };
        assert!(a.service.on_tx_publish(publish.clone(), addr(5001)));

        let sent = a.transport.take_packets();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, addr(5002));
        assert!(matches!(&sent[0].0, GossipPacket::TxPublish(p) if p.hop_limit == 9));

        assert!(!a.service.on_tx_publish(publish, addr(5002)));
        assert_eq!(a.transport.sent_count(), 0);
    }

    #[test]
    fn test_tx_with_spent_hops_is_kept_not_forwarded() {
        let a = node("A", 0);
        let publish = TxPublish {
            transaction: claim("a.txt", 1, 1),
            hop_limit: 0,
        };
        assert!(a.service.on_tx_publish(publish, addr(5001)));
        assert_eq!(a.transport.sent_count(), 0);
        assert_eq!(a.service.chain().builder().transactions().len(), 1);
    }

    #[traced_test]
    #[test]
    fn test_conflicting_tx_ignored() {
        let a = node("A", 0);
        let first = TxPublish {
            transaction: claim("a.txt", 1, 1),
            hop_limit: 10,
        };
        let second = TxPublish {
            transaction: claim("a.txt", 2, 2),
            hop_limit: 10,
        };
        assert!(a.service.on_tx_publish(first, addr(5001)));
        assert!(!a.service.on_tx_publish(second, addr(5001)));
        assert!(logs_contain("IGNORING TX: there is already an owner"));
    }

    #[traced_test]
    #[test]
    fn test_block_publish_attaches_and_rebroadcasts() {
        let a = node("A", 0);
        let genesis = mined(ZERO_HASH, vec![claim("a.txt", 1, 1)], 1);
        let publish = BlockPublish {
            block: genesis.clone(),
            hop_limit: BLOCK_HOP_LIMIT,
        };
        assert!(a.service.on_block_publish(publish.clone(), addr(5001)));
        assert_eq!(a.service.length(), 1);
        assert!(logs_contain("CHAIN "));

        let sent = a.transport.take_packets();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, addr(5002));
        assert!(matches!(&sent[0].0, GossipPacket::BlockPublish(p) if p.hop_limit == BLOCK_HOP_LIMIT - 1));

        assert!(a.bus.drain().contains(&FrontendUpdate::ChainHead {
            head: hash_to_hex(&genesis.hash()),
            length: 1,
        }));

        assert!(!a.service.on_block_publish(publish, addr(5002)));
        assert_eq!(a.transport.sent_count(), 0);
    }

    #[test]
    fn test_block_without_work_dropped() {
        let a = node("A", 0);
        let mut block = mined(ZERO_HASH, vec![], 1);
        while block.has_valid_pow(1) {
            block.nonce[5] = block.nonce[5].wrapping_add(1);
        }
        let publish = BlockPublish {
            block,
            hop_limit: BLOCK_HOP_LIMIT,
        };
        assert!(!a.service.on_block_publish(publish, addr(5001)));
        assert!(a.service.chain().is_empty());
        assert_eq!(a.transport.sent_count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_longer_fork_invalidates_lost_claims() {
        let a = node("A", 0);
        let a1 = mined(ZERO_HASH, vec![claim("x.txt", 1, 0)], 1);
        a.service.ingest_block(a1).unwrap();

        let b1 = mined(ZERO_HASH, vec![claim("x.txt", 2, 1)], 2);
        let b2 = mined(b1.hash(), vec![], 3);
        a.service.ingest_block(b1).unwrap();
        assert!(logs_contain(&format!("FORK-SHORTER {}", hash_to_hex(&ZERO_HASH))));
        assert!(a.listener.calls().is_empty());

        a.service.ingest_block(b2.clone()).unwrap();
        assert!(logs_contain("FORK-LONGER rewind 1 blocks"));
        assert_eq!(a.service.head_hash(), Some(b2.hash()));
        assert_eq!(a.listener.calls(), vec![OwnershipCall::Invalidate([1; 32])]);
        assert!(a.service.chain().builder().is_empty());
    }

    #[test]
    fn test_longer_fork_keeps_compatible_claims_pending() {
        let a = node("A", 0);
        let x = claim("x.txt", 1, 0);
        a.service.ingest_block(mined(ZERO_HASH, vec![x.clone()], 1)).unwrap();

        let b1 = mined(ZERO_HASH, vec![claim("y.txt", 2, 1)], 2);
        let b2 = mined(b1.hash(), vec![], 3);
        a.service.ingest_block(b1).unwrap();
        a.service.ingest_block(b2).unwrap();

        assert_eq!(a.service.length(), 2);
        assert!(a.listener.calls().is_empty());
        assert_eq!(a.service.chain().builder().transactions(), &[x]);
    }
}
