//! # Subsystem Container
//!
//! Configuration and the wired subsystem instances of one node.

pub mod config;
pub mod subsystems;

pub use config::{
    ChainConfig, ConfigError, FileConfig, FrontendConfig, GossipConfig, NetworkConfig, NodeConfig,
};
pub use subsystems::SubsystemContainer;
