//! Chain → files: subscribed publications become downloads, rewound claims
//! invalidate their file.

use std::sync::Arc;

use rm_03_file_sharing::{FileError, FileService};
use rm_04_file_chain::OwnershipListener;
use shared_types::{FileRecord, Hash};
use tracing::{debug, warn};

pub struct FileOwnershipBridge {
    files: Arc<FileService>,
}

impl FileOwnershipBridge {
    pub fn new(files: Arc<FileService>) -> Self {
        Self { files }
    }
}

impl OwnershipListener for FileOwnershipBridge {
    fn download(&self, file: &FileRecord, artist: &str) {
        match self.files.download(&file.name, file.metafile_hash, artist) {
            Ok(_) => debug!("fetching {} published by {}", file.name, artist),
            Err(FileError::AlreadyIndexed(_)) => {
                debug!("{} already held", file.name)
            }
            Err(e) => warn!("cannot fetch {} from {}: {}", file.name, artist, e),
        }
    }

    fn invalidate(&self, metahash: &Hash) {
        self.files.invalidate(metahash);
    }
}
