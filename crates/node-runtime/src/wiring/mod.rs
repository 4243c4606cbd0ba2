//! # Runtime Wiring
//!
//! Connects the sockets to the handlers and owns the background tasks.
//!
//! ```text
//! gossip socket ──recv──→ receive_loop ──→ GossipDispatcher ──→ subsystems
//! client socket ──recv──→ receive_loop ──→ ClientHandler    ──→ subsystems
//!
//! anti-entropy ticker ─┐
//! route rumor ticker  ─┼── stopped by one watch channel
//! miner               ─┘
//! ```

pub mod receive;
pub mod runtime;

pub use receive::receive_loop;
pub use runtime::NodeRuntime;
