//! # Node Configuration
//!
//! Unified configuration for every subsystem and the runtime.
//!
//! Every section has a `Default` carrying the protocol constants; the CLI
//! (see [`crate::cli`]) only overrides what the operator names.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use rm_03_file_sharing::FileSettings;
use rm_04_file_chain::ChainSettings;
use rm_02_rumor_mongering::RumorSettings;
use shared_types::{
    DEFAULT_LEADING_ZERO_BYTES, MAX_PACKET_SIZE, SEARCH_MATCH_THRESHOLD, SEARCH_MAX_BUDGET,
};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub gossip: GossipConfig,
    pub files: FileConfig,
    pub chain: ChainConfig,
    pub frontend: FrontendConfig,
}

impl NodeConfig {
    /// Reject configurations the node cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gossip.name.trim().is_empty() {
            return Err(ConfigError::MissingName);
        }
        if self.network.gossip_addr.is_none() {
            return Err(ConfigError::MissingGossipAddr);
        }
        if self.network.max_packet_size < 2 * shared_types::CHUNK_SIZE {
            return Err(ConfigError::PacketSizeTooSmall(self.network.max_packet_size));
        }
        Ok(())
    }

    pub fn rumor_settings(&self) -> RumorSettings {
        RumorSettings {
            mongering_timeout: self.gossip.mongering_timeout,
            anti_entropy_period: self.gossip.anti_entropy_period,
            route_rumor_period: self.gossip.route_rumor_period,
        }
    }

    pub fn file_settings(&self) -> FileSettings {
        FileSettings {
            data_request_timeout: self.files.data_request_timeout,
            search_period: self.files.search_period,
            search_max_budget: self.files.search_max_budget,
            search_match_threshold: self.files.search_match_threshold,
            ..FileSettings::default()
        }
    }

    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            leading_zero_bytes: self.chain.leading_zero_bytes,
            first_block_delay: self.chain.first_block_delay,
            ..ChainSettings::default()
        }
    }
}

/// Configuration errors. Fatal: the node exits before starting any task.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a non-empty -name is required")]
    MissingName,

    #[error("-gossipAddr is required")]
    MissingGossipAddr,

    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),

    #[error("invalid subscription `{0}`, expected NAME=HEX_PUBLIC_KEY")]
    InvalidSubscription(String),

    #[error("max packet size {0} cannot carry a data reply")]
    PacketSizeTooSmall(usize),
}

/// Sockets and neighbors.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Client-facing port, bound on 127.0.0.1.
    pub ui_port: u16,
    /// Peer-facing endpoint.
    pub gossip_addr: Option<SocketAddr>,
    /// Bootstrap neighbors.
    pub peers: Vec<SocketAddr>,
    /// Receive buffer and encode limit.
    pub max_packet_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ui_port: 8080,
            gossip_addr: None,
            peers: Vec::new(),
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

/// Rumor engine.
#[derive(Debug, Clone)]
pub struct GossipConfig {
    /// Origin name of this node.
    pub name: String,
    /// Legacy broadcast mode, no rumor engine.
    pub simple: bool,
    pub anti_entropy_period: Duration,
    pub mongering_timeout: Duration,
    /// `-rtimer`; `None` or zero disables route rumors.
    pub route_rumor_period: Option<Duration>,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            simple: false,
            anti_entropy_period: Duration::from_secs(1),
            mongering_timeout: Duration::from_secs(1),
            route_rumor_period: None,
        }
    }
}

/// File sharing.
#[derive(Debug, Clone)]
pub struct FileConfig {
    pub shared_dir: PathBuf,
    pub downloads_dir: PathBuf,
    pub data_request_timeout: Duration,
    /// Interval between rounds of an expanding search.
    pub search_period: Duration,
    pub search_max_budget: u64,
    pub search_match_threshold: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            shared_dir: PathBuf::from("_SharedFiles"),
            downloads_dir: PathBuf::from("_Downloads"),
            data_request_timeout: Duration::from_secs(5),
            search_period: Duration::from_secs(1),
            search_max_budget: SEARCH_MAX_BUDGET,
            search_match_threshold: SEARCH_MATCH_THRESHOLD,
        }
    }
}

/// Ownership chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub leading_zero_bytes: usize,
    pub first_block_delay: Duration,
    /// PKCS#1 PEM private key; a fresh in-memory key when unset.
    pub key_file: Option<PathBuf>,
    /// Artists followed from startup, with their DER public keys.
    pub subscriptions: Vec<(String, Vec<u8>)>,
    /// Run the miner.
    pub mining: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            leading_zero_bytes: DEFAULT_LEADING_ZERO_BYTES,
            first_block_delay: Duration::from_secs(5),
            key_file: None,
            subscriptions: Vec::new(),
            mining: true,
        }
    }
}

/// Frontend updates.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// HTTP port of the web frontend, served by a separate process.
    pub gui_port: u16,
    /// Updates kept for late subscribers.
    pub history: usize,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            gui_port: 8080,
            history: 1024,
        }
    }
}
