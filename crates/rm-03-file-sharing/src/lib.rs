//! # File Sharing Subsystem
//!
//! Content-addressed files split into 8 KiB chunks, fetched hop by hop from
//! named peers, and found by a budgeted keyword flood.
//!
//! ## Content Addressing
//!
//! ```text
//! file ──split──→ chunk 1 │ chunk 2 │ ... │ chunk n      (n ≤ 256)
//!                    │         │               │
//!                  sha256    sha256          sha256
//!                    └────┬────┴───────────────┘
//!                      metafile  (n × 32 bytes)
//!                         │
//!                      sha256 ──→ metahash
//! ```
//!
//! Every hash a node can serve (a metahash or a chunk hash) resolves to one
//! file and chunk in the [`FileIndex`]; chunk `0` is the metafile.
//!
//! ## Downloads
//!
//! One request is outstanding per download. The metafile comes first, from
//! the named peer or from the peer that completed a search match; then each
//! chunk in order, from that peer or from whoever advertised the chunk.
//! A reply only counts when its data hashes to what was asked and it comes
//! from the peer that was asked. Five seconds without a reply aborts.
//!
//! ## Search
//!
//! A request with budget `b` is answered locally and its remaining `b - 1`
//! is split among random neighbors other than the sender. The same search
//! seen again within half a second is dropped. The client side starts at
//! budget 2 and doubles each second up to 32, stopping early once two
//! distinct full matches came back.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{FileError, FileIndex, FileLocation, FileState, SharedFile, SharedFileRef};
pub use ports::FileStore;
pub use service::{FileService, FileSettings};
