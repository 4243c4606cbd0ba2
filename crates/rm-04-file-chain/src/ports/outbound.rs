//! Outbound ports: what the chain asks of the file subsystem.

use shared_types::{FileRecord, Hash};

/// Reacts to ownership changes on the active chain.
pub trait OwnershipListener: Send + Sync {
    /// A subscribed artist published `file`; fetch it from `artist`.
    fn download(&self, file: &FileRecord, artist: &str);

    /// The claim on `metahash` was rewound away.
    fn invalidate(&self, metahash: &Hash);
}

/// Ignores every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOwnershipListener;

impl OwnershipListener for NullOwnershipListener {
    fn download(&self, _file: &FileRecord, _artist: &str) {}

    fn invalidate(&self, _metahash: &Hash) {}
}
