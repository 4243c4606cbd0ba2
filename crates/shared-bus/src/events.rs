//! # Frontend Updates
//!
//! Everything the network core tells the user about. The core never raises
//! user-visible errors directly; this channel is the only surface.

use serde::{Deserialize, Serialize};
use shared_types::{hash_to_hex, Hash, PrivateMessage, RumorMessage};

/// One update for the frontend. Serialized as `{"type": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrontendUpdate {
    /// A rumor with text was accepted.
    Rumor { origin: String, id: u32, text: String },

    /// A neighbor endpoint was added to the peer table.
    Peer { address: String },

    /// A private message was delivered or sent.
    Private {
        origin: String,
        destination: String,
        text: String,
    },

    /// A new destination became routable.
    Contact { name: String },

    /// A local file was indexed.
    IndexedFile { filename: String, metahash: String },

    /// A search found every chunk of a file.
    AvailableFile { filename: String, metahash: String },

    /// A download started.
    ConstructingFile {
        filename: String,
        metahash: String,
        origin: String,
    },

    /// A download finished and the file is on disk.
    ReconstructedFile { filename: String, metahash: String },

    /// A file's ownership transaction was rewound away.
    InvalidatedFile { filename: String, metahash: String },

    /// The active chain head changed.
    ChainHead { head: String, length: u64 },
}

impl FrontendUpdate {
    pub fn rumor(rumor: &RumorMessage) -> Self {
        Self::Rumor {
            origin: rumor.origin.clone(),
            id: rumor.id,
            text: rumor.text.clone(),
        }
    }

    pub fn private(message: &PrivateMessage) -> Self {
        Self::Private {
            origin: message.origin.clone(),
            destination: message.destination.clone(),
            text: message.text.clone(),
        }
    }

    pub fn indexed_file(filename: &str, metahash: &Hash) -> Self {
        Self::IndexedFile {
            filename: filename.to_string(),
            metahash: hash_to_hex(metahash),
        }
    }

    /// Topic used for subscription filtering.
    pub fn topic(&self) -> FrontendTopic {
        match self {
            Self::Rumor { .. } | Self::Private { .. } => FrontendTopic::Messages,
            Self::Peer { .. } | Self::Contact { .. } => FrontendTopic::Peers,
            Self::IndexedFile { .. }
            | Self::AvailableFile { .. }
            | Self::ConstructingFile { .. }
            | Self::ReconstructedFile { .. }
            | Self::InvalidatedFile { .. } => FrontendTopic::Files,
            Self::ChainHead { .. } => FrontendTopic::Chain,
        }
    }
}

/// Coarse grouping of updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrontendTopic {
    Messages,
    Peers,
    Files,
    Chain,
}

/// Which topics a subscriber wants.
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Empty means every topic.
    pub topics: Vec<FrontendTopic>,
}

impl UpdateFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn topics(topics: Vec<FrontendTopic>) -> Self {
        Self { topics }
    }

    pub fn matches(&self, update: &FrontendUpdate) -> bool {
        self.topics.is_empty() || self.topics.contains(&update.topic())
    }
}
