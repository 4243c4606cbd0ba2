//! # Rumor-Mesh Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # in-process mesh of full nodes over a MemoryHub
//! └── integration/      # multi-node scenarios
//!     ├── rumors.rs     # rumor spread, private routing, simple mode
//!     ├── files.rs      # routed download, search and multi-source download
//!     └── chain.rs      # claims, subscriptions, late joiners, forks
//!
//! tests/benches/        # criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rm-tests
//! cargo test -p rm-tests integration::chain::
//! cargo bench -p rm-tests
//! ```

pub mod harness;
pub mod integration;
