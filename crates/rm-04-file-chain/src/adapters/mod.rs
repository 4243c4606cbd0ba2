//! Adapters Layer - Ownership listeners for tests and harnesses

pub mod recording;

pub use recording::{OwnershipCall, RecordingOwnershipListener};
