//! Ports Layer - Trait definitions for external dependencies

pub mod outbound;

pub use outbound::*;
