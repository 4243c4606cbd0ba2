//! # Adapters
//!
//! Port implementations that connect one subsystem to another.

pub mod ownership;

pub use ownership::FileOwnershipBridge;
