//! Fetching blocks whose parents never arrived.
//!
//! Requests are flooded with a budget that drops by one per hop; whoever
//! knows a requested block answers with a routed reply.

use std::net::SocketAddr;

use mesh_telemetry::{metric_inc, PACKETS_DROPPED};
use rm_01_peer_routing::{PeerRoutingApi, RoutedSend};
use shared_types::{
    Block, BlockReply, BlockRequest, GossipPacket, Hash, BLOCK_HOP_LIMIT, BLOCK_REQUEST_BUDGET,
};
use tracing::debug;

use super::ChainService;
use crate::domain::AddOutcome;

impl ChainService {
    /// Ask the neighbors for every parent the pending pool waits on.
    /// Returns how many neighbors were asked.
    pub fn request_missing(&self) -> usize {
        let missing = self.chain.read().missing_parents();
        if missing.is_empty() {
            return 0;
        }
        self.broadcast_request(missing, None)
    }

    /// Ask the neighbors for their head, used when joining.
    pub fn request_head(&self) -> usize {
        self.broadcast_request(Vec::new(), None)
    }

    fn broadcast_request(&self, block_hashes: Vec<Hash>, exclude: Option<SocketAddr>) -> usize {
        let packet = GossipPacket::BlockRequest(BlockRequest {
            origin: self.network.name().to_string(),
            block_hashes,
            budget: BLOCK_REQUEST_BUDGET,
        });
        self.network.broadcast(&packet, exclude)
    }

    /// A block request flooded to us by `from`. Returns how many blocks we
    /// sent back.
    pub fn on_block_request(&self, request: BlockRequest, from: SocketAddr) -> usize {
        let name = self.network.name();
        if request.origin == name {
            return 0;
        }
        if request.budget == 0 {
            metric_inc!(PACKETS_DROPPED, &["block_budget"]);
            return 0;
        }
        self.network.learn_route(&request.origin, from);

        let (known, unknown): (Vec<Block>, Vec<Hash>) = {
            let chain = self.chain.read();
            if request.block_hashes.is_empty() {
                let head = chain.head().map(|head| head.block().clone());
                (head.into_iter().collect(), Vec::new())
            } else {
                let mut known = Vec::new();
                let mut unknown = Vec::new();
                for hash in &request.block_hashes {
                    match chain.block(hash) {
                        Some(block) => known.push(block.block().clone()),
                        None => unknown.push(*hash),
                    }
                }
                (known, unknown)
            }
        };

        let mut sent = 0;
        for block in known {
            let reply = BlockReply {
                origin: name.to_string(),
                destination: request.origin.clone(),
                hop_limit: BLOCK_HOP_LIMIT,
                blocks: vec![block],
            };
            match self.network.send_routed(reply) {
                Ok(_) => sent += 1,
                Err(e) => debug!("block reply to {} not sent: {}", request.origin, e),
            }
        }

        if !unknown.is_empty() && request.budget > 1 {
            let packet = GossipPacket::BlockRequest(BlockRequest {
                origin: request.origin,
                block_hashes: unknown,
                budget: request.budget - 1,
            });
            self.network.broadcast(&packet, Some(from));
        }
        sent
    }

    /// Blocks sent back to a request. Returns how many were new to us.
    pub fn on_block_reply(&self, reply: BlockReply, from: SocketAddr) -> usize {
        let name = self.network.name();
        if reply.origin != name {
            self.network.learn_route(&reply.origin, from);
        }
        if reply.destination != name {
            if let Err(e) = self.network.send_routed(reply) {
                debug!("block reply not forwarded: {}", e);
            }
            return 0;
        }

        let mut added = 0;
        for block in reply.blocks {
            match self.ingest_block(block) {
                Ok(AddOutcome::Known) => {}
                Ok(_) => added += 1,
                Err(e) => debug!("replied block from {} dropped: {}", reply.origin, e),
            }
        }
        added
    }
}
