use std::sync::Arc;

use mesh_telemetry::{log_event, metric_inc, BLOCKS_MINED};
use rm_01_peer_routing::PeerRoutingApi;
use shared_types::{hash_to_hex, Block, BlockPublish, GossipPacket, BLOCK_HOP_LIMIT};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::ChainService;

impl ChainService {
    /// Mine until `shutdown` flips. Nonces are tried in batches on the
    /// blocking pool; the chain lock is only taken to snapshot the builder
    /// and to attach a found block.
    pub async fn run_miner(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            let template = self.chain.read().mining_template();
            let Some(template) = template else {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.idle_delay) => continue,
                    _ = shutdown.changed() => break,
                }
            };

            let attempts = self.settings.mining_batch;
            let search = tokio::task::spawn_blocking(move || {
                template.search(attempts, &mut rand::thread_rng())
            });
            let found = tokio::select! {
                found = search => found,
                _ = shutdown.changed() => break,
            };
            match found {
                Ok(Some(block)) => {
                    self.on_block_mined(block);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("mining batch failed: {}", e);
                    break;
                }
            }
        }
        info!("miner stopped");
    }

    /// Try up to `attempts` nonces on the current builder right here.
    pub fn mine_once(self: &Arc<Self>, attempts: usize) -> Option<Block> {
        let template = self.chain.read().mining_template()?;
        let block = template.search(attempts, &mut rand::thread_rng())?;
        self.on_block_mined(block.clone());
        Some(block)
    }

    /// Attach a block this node found and announce it. A block mined on an
    /// empty chain is announced after `first_block_delay`.
    fn on_block_mined(self: &Arc<Self>, block: Block) -> bool {
        let hash = block.hash();
        log_event!(info, "chain", "FOUND-BLOCK {}", hash_to_hex(&hash));
        metric_inc!(BLOCKS_MINED);

        let was_empty = self.chain.read().is_empty();
        if let Err(e) = self.ingest_block(block.clone()) {
            debug!("mined block {} not attached: {}", hash_to_hex(&hash), e);
            return false;
        }

        let packet = GossipPacket::BlockPublish(BlockPublish {
            block,
            hop_limit: BLOCK_HOP_LIMIT,
        });
        if was_empty {
            let service = Arc::clone(self);
            let delay = self.settings.first_block_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                service.network.broadcast(&packet, None);
            });
        } else {
            self.network.broadcast(&packet, None);
        }
        true
    }
}
