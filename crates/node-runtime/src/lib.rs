//! # Node Runtime Library
//!
//! Assembles one gossip node out of the subsystem crates and exposes the
//! pieces for integration tests. The `main.rs` binary binds real UDP
//! sockets around the same runtime.
//!
//! ## Modules
//!
//! - `cli` - historical command line flags
//! - `container/` - configuration and subsystem construction
//! - `adapters/` - ports one subsystem implements for another
//! - `handlers/` - peer and client packet dispatch
//! - `wiring/` - receive loops, tickers and shutdown

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod cli;
pub mod container;
pub mod handlers;
pub mod wiring;

#[cfg(test)]
mod testing;

pub use container::{ConfigError, NodeConfig, SubsystemContainer};
pub use wiring::NodeRuntime;
