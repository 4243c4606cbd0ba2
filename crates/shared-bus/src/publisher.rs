//! # Frontend Sink
//!
//! The narrow interface the network core publishes user-facing updates to,
//! and its implementations.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use shared_types::{hash_to_hex, Hash, PrivateMessage, RumorMessage};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::events::{FrontendUpdate, UpdateFilter};
use crate::subscriber::Subscription;
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_HISTORY_CAPACITY};

/// Where the core sends user-facing updates.
///
/// Implementors provide [`FrontendSink::publish`]; the `push_*` helpers build
/// the matching [`FrontendUpdate`].
pub trait FrontendSink: Send + Sync {
    /// Deliver one update.
    fn publish(&self, update: FrontendUpdate);

    fn push_rumor(&self, rumor: &RumorMessage) {
        self.publish(FrontendUpdate::rumor(rumor));
    }

    fn push_peer(&self, peer: SocketAddr) {
        self.publish(FrontendUpdate::Peer {
            address: peer.to_string(),
        });
    }

    fn push_private(&self, message: &PrivateMessage) {
        self.publish(FrontendUpdate::private(message));
    }

    fn push_contact(&self, name: &str) {
        self.publish(FrontendUpdate::Contact {
            name: name.to_string(),
        });
    }

    fn push_indexed_file(&self, filename: &str, metahash: &Hash) {
        self.publish(FrontendUpdate::indexed_file(filename, metahash));
    }

    fn push_available_file(&self, filename: &str, metahash: &Hash) {
        self.publish(FrontendUpdate::AvailableFile {
            filename: filename.to_string(),
            metahash: hash_to_hex(metahash),
        });
    }

    fn push_constructing_file(&self, filename: &str, metahash: &Hash, origin: &str) {
        self.publish(FrontendUpdate::ConstructingFile {
            filename: filename.to_string(),
            metahash: hash_to_hex(metahash),
            origin: origin.to_string(),
        });
    }

    fn push_reconstructed_file(&self, filename: &str, metahash: &Hash) {
        self.publish(FrontendUpdate::ReconstructedFile {
            filename: filename.to_string(),
            metahash: hash_to_hex(metahash),
        });
    }

    fn push_invalidated_file(&self, filename: &str, metahash: &Hash) {
        self.publish(FrontendUpdate::InvalidatedFile {
            filename: filename.to_string(),
            metahash: hash_to_hex(metahash),
        });
    }

    fn push_chain_head(&self, head: &Hash, length: u64) {
        self.publish(FrontendUpdate::ChainHead {
            head: hash_to_hex(head),
            length,
        });
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFrontendSink;

impl FrontendSink for NullFrontendSink {
    fn publish(&self, _update: FrontendUpdate) {}
}

/// Writes every update to the log at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFrontendSink;

impl FrontendSink for LoggingFrontendSink {
    fn publish(&self, update: FrontendUpdate) {
        info!(topic = ?update.topic(), ?update, "frontend update");
    }
}

/// In-memory bus: live subscribers via `tokio::sync::broadcast`, plus a
/// bounded history that a poller can drain.
pub struct InMemoryFrontendBus {
    sender: broadcast::Sender<FrontendUpdate>,
    history: Mutex<VecDeque<FrontendUpdate>>,
    history_capacity: usize,
    published: AtomicU64,
}

impl InMemoryFrontendBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY, DEFAULT_HISTORY_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(channel_capacity: usize, history_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        Self {
            sender,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            published: AtomicU64::new(0),
        }
    }

    /// Receive future updates matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: UpdateFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New frontend subscription");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Take every buffered update, oldest first.
    pub fn drain(&self) -> Vec<FrontendUpdate> {
        self.history.lock().drain(..).collect()
    }

    /// Copy of the buffered updates without consuming them.
    pub fn snapshot(&self) -> Vec<FrontendUpdate> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryFrontendBus {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontendSink for InMemoryFrontendBus {
    fn publish(&self, update: FrontendUpdate) {
        self.published.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history.lock();
            if history.len() == self.history_capacity {
                history.pop_front();
            }
            history.push_back(update.clone());
        }
        // No live subscribers is normal; the history still has the update.
        let _ = self.sender.send(update);
    }
}
