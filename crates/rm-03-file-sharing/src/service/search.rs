use std::net::SocketAddr;
use std::sync::Arc;

use mesh_telemetry::{metric_inc, PACKETS_DROPPED, SEARCHES_FORWARDED};
use rm_01_peer_routing::{PeerRoutingApi, RoutedSend};
use shared_types::{
    hash_to_hex, GossipPacket, SearchReply, SearchRequest, SEARCH_REPLY_HOP_LIMIT,
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::FileService;
use crate::domain::{sanitize_result, search_fingerprint, split_budget};

impl FileService {
    /// A search flooded to us by `from`. Returns `false` when it was dropped.
    pub fn on_search_request(&self, request: SearchRequest, from: SocketAddr) -> bool {
        let name = self.network.name();
        if request.origin == name {
            return false;
        }
        if request.budget == 0 {
            metric_inc!(PACKETS_DROPPED, &["search_budget"]);
            return false;
        }
        self.network.learn_route(&request.origin, from);

        let fingerprint = search_fingerprint(&request.origin, &request.keywords);
        let now = tokio::time::Instant::now().into_std();
        if !self.recent_searches.lock().observe(fingerprint, now) {
            debug!("duplicate search from {} dropped", request.origin);
            metric_inc!(PACKETS_DROPPED, &["search_duplicate"]);
            return false;
        }

        self.forward_search(&request, request.budget - 1, Some(from));

        let results = self.index.read().search(&request.keywords);
        if !results.is_empty() {
            let reply = SearchReply {
                origin: name.to_string(),
                destination: request.origin,
                hop_limit: SEARCH_REPLY_HOP_LIMIT,
                results,
            };
            let _ = self.network.send_routed(reply);
        }
        true
    }

    /// Spread `budget` over random neighbors. Returns how many got a copy.
    fn forward_search(&self, request: &SearchRequest, budget: u64, exclude: Option<SocketAddr>) -> usize {
        if budget == 0 {
            return 0;
        }
        let wanted = usize::try_from(budget).unwrap_or(usize::MAX);
        let neighbors = self.network.random_neighbors(wanted, exclude);
        let shares = split_budget(budget, neighbors.len());
        let mut sent = 0;
        for (peer, share) in neighbors.into_iter().zip(shares) {
            let packet = GossipPacket::SearchRequest(SearchRequest {
                origin: request.origin.clone(),
                budget: share,
                keywords: request.keywords.clone(),
            });
            if self.network.send(&packet, peer).is_ok() {
                metric_inc!(SEARCHES_FORWARDED);
                sent += 1;
            }
        }
        sent
    }

    /// Search results from `from`. Returns `true` when they were for us.
    /// Only results matching a running search are kept.
    pub fn on_search_reply(&self, reply: SearchReply, from: SocketAddr) -> bool {
        let name = self.network.name();
        if reply.origin != name {
            self.network.learn_route(&reply.origin, from);
        }
        if reply.destination != name {
            let _ = self.network.send_routed(reply);
            return false;
        }
        for result in &reply.results {
            let Some(result) = sanitize_result(result) else {
                debug!(
                    "search result {} from {} claims {} chunks",
                    result.file_name, reply.origin, result.chunk_count
                );
                metric_inc!(PACKETS_DROPPED, &["search_result"]);
                continue;
            };
            if !self.totals.lock().expects(&result.file_name) {
                debug!("unsolicited match {} from {} ignored", result.file_name, reply.origin);
                continue;
            }
            let chunks: Vec<String> = result.chunk_map.iter().map(u64::to_string).collect();
            info!(
                "FOUND match {} at {} metafile={} chunks={}",
                result.file_name,
                reply.origin,
                hash_to_hex(&result.metafile_hash),
                chunks.join(",")
            );

            let (file, completed) = self
                .index
                .write()
                .merge_search_result(&result, &reply.origin);
            if completed {
                let file_name = file.lock().name().to_owned();
                self.network
                    .frontend()
                    .push_available_file(&file_name, &result.metafile_hash);
            }
            if result.is_full_match() {
                self.totals.lock().record(&reply.origin, &result.file_name);
            }
        }
        true
    }

    /// Run a search for `keywords`. A zero `budget` starts small and doubles
    /// every round up to the maximum; any other budget is used for a single
    /// round. The task yields `true` once enough full matches came back.
    pub fn search(self: &Arc<Self>, keywords: Vec<String>, budget: u64) -> JoinHandle<bool> {
        tokio::spawn(Arc::clone(self).run_search(keywords, budget))
    }

    async fn run_search(self: Arc<Self>, keywords: Vec<String>, budget: u64) -> bool {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return false;
        }
        let expanding = budget == 0;
        let mut budget = if expanding {
            self.settings.search_initial_budget
        } else {
            budget
        };
        let max_budget = self.settings.search_max_budget;
        self.totals.lock().start(&keywords);

        let finished = loop {
            debug!("searching {} with budget {}", keywords.join(","), budget);
            let request = SearchRequest {
                origin: self.network.name().to_string(),
                budget,
                keywords: keywords.clone(),
            };
            self.forward_search(&request, budget, None);
            tokio::time::sleep(self.settings.search_period).await;

            let matches = self.totals.lock().count(&keywords);
            if matches >= self.settings.search_match_threshold {
                break true;
            }
            if !expanding || budget >= max_budget {
                break false;
            }
            budget = budget.saturating_mul(2).min(max_budget);
        };

        self.totals.lock().finish(&keywords);
        if finished {
            info!("SEARCH FINISHED");
        } else {
            info!("SEARCH for {} ended without enough matches", keywords.join(","));
        }
        finished
    }
}
