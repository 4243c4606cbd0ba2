//! Ports Layer - Trait definitions for external dependencies

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
