//! Adapters Layer - File stores
//!
//! - `fs`: `_SharedFiles/` and `_Downloads/` directories on disk
//! - `memory`: an in-process map for tests and harnesses

pub mod fs;
pub mod memory;

pub use fs::FsFileStore;
pub use memory::MemoryFileStore;
