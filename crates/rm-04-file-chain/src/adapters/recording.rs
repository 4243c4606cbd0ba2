use parking_lot::Mutex;
use shared_types::{FileRecord, Hash};

use crate::ports::OwnershipListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipCall {
    Download { file: FileRecord, artist: String },
    Invalidate(Hash),
}

/// Remembers every call in order.
#[derive(Debug, Default)]
pub struct RecordingOwnershipListener {
    calls: Mutex<Vec<OwnershipCall>>,
}

impl RecordingOwnershipListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<OwnershipCall> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<OwnershipCall> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl OwnershipListener for RecordingOwnershipListener {
    fn download(&self, file: &FileRecord, artist: &str) {
        self.calls.lock().push(OwnershipCall::Download {
            file: file.clone(),
            artist: artist.to_owned(),
        });
    }

    fn invalidate(&self, metahash: &Hash) {
        self.calls.lock().push(OwnershipCall::Invalidate(*metahash));
    }
}
