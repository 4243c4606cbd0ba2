use rm_01_peer_routing::PeerRoutingApi;
use shared_types::Transaction;
use tracing::{debug, info};

use super::ChainService;

impl ChainService {
    /// Follow `artist`, known by `public_key`. Files the artist already owns
    /// on the active chain are fetched right away. Returns how many
    /// downloads were started.
    pub fn subscribe(&self, artist: &str, public_key: Vec<u8>) -> usize {
        if !self.subscriptions.write().subscribe(artist, public_key) {
            debug!("already subscribed to {}", artist);
        }
        info!("SUBSCRIBED to {}", artist);
        let active = self.chain.read().active_transactions();
        self.fetch_subscribed(&active)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Start a download for every subscribed transaction whose artist we
    /// have a route to.
    pub(crate) fn fetch_subscribed(&self, txs: &[Transaction]) -> usize {
        let wanted: Vec<(Transaction, String)> = {
            let subscriptions = self.subscriptions.read();
            subscriptions
                .matching(txs)
                .map(|(tx, artist)| (tx.clone(), artist.to_owned()))
                .collect()
        };
        let mut started = 0;
        for (tx, artist) in wanted {
            if self.network.target(&artist).is_none() {
                debug!("no route to {}, {} not fetched", artist, tx.file.name);
                continue;
            }
            self.listener.download(&tx.file, &artist);
            started += 1;
        }
        started
    }
}
