//! # File Service
//!
//! Connects the content index to the mesh and the file store.
//!
//! - `indexing`: local files and restored partial downloads
//! - `transfer`: data requests and replies, the download loop
//! - `search`: search flooding and the expanding-ring search of the client

mod indexing;
mod search;
mod transfer;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rm_01_peer_routing::GossipNetwork;
use shared_types::{
    Hash, SearchResult, SEARCH_INITIAL_BUDGET, SEARCH_MATCH_THRESHOLD, SEARCH_MAX_BUDGET,
};

use crate::domain::{DataWaiters, FileIndex, FileState, RecentSearches, SharedFileRef, TotalMatches};
use crate::ports::FileStore;

/// Timers and limits of the file subsystem.
#[derive(Debug, Clone)]
pub struct FileSettings {
    /// How long a download waits for one data reply.
    pub data_request_timeout: Duration,
    /// Interval between rounds of a client search.
    pub search_period: Duration,
    pub search_initial_budget: u64,
    pub search_max_budget: u64,
    /// Distinct full matches that end a client search.
    pub search_match_threshold: usize,
    /// Repeats of the same search inside this window are dropped.
    pub search_dedup_window: Duration,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            data_request_timeout: Duration::from_secs(5),
            search_period: Duration::from_secs(1),
            search_initial_budget: SEARCH_INITIAL_BUDGET,
            search_max_budget: SEARCH_MAX_BUDGET,
            search_match_threshold: SEARCH_MATCH_THRESHOLD,
            search_dedup_window: Duration::from_millis(500),
        }
    }
}

/// The file subsystem of one node.
pub struct FileService {
    network: Arc<GossipNetwork>,
    store: Arc<dyn FileStore>,
    index: RwLock<FileIndex>,
    waiters: DataWaiters,
    recent_searches: Mutex<RecentSearches>,
    totals: Mutex<TotalMatches>,
    settings: FileSettings,
}

impl FileService {
    pub fn new(network: Arc<GossipNetwork>, store: Arc<dyn FileStore>, settings: FileSettings) -> Arc<Self> {
        Arc::new(Self {
            network,
            store,
            index: RwLock::new(FileIndex::new()),
            waiters: DataWaiters::new(),
            recent_searches: Mutex::new(RecentSearches::new(settings.search_dedup_window)),
            totals: Mutex::new(TotalMatches::new()),
            settings,
        })
    }

    pub fn network(&self) -> &Arc<GossipNetwork> {
        &self.network
    }

    pub fn settings(&self) -> &FileSettings {
        &self.settings
    }

    pub fn file(&self, metahash: &Hash) -> Option<SharedFileRef> {
        self.index.read().get(metahash)
    }

    pub fn file_state(&self, metahash: &Hash) -> Option<FileState> {
        self.file(metahash).map(|file| file.lock().state())
    }

    /// What this node would answer to a search for `keywords`.
    pub fn local_matches(&self, keywords: &[String]) -> Vec<SearchResult> {
        self.index.read().search(keywords)
    }

    /// Data requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.waiters.pending()
    }
}
