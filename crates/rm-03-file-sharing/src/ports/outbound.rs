//! Outbound ports: where file bytes live.

use crate::domain::{FileError, FileLocation, Result};

/// Byte storage for shared and downloaded files.
///
/// Chunks are addressed 1-based; chunk `i` starts at byte
/// `(i - 1) * CHUNK_SIZE`.
pub trait FileStore: Send + Sync {
    /// Whole content of a file.
    fn read_file(&self, location: FileLocation, name: &str) -> Result<Vec<u8>>;

    /// One chunk of a file. The last chunk may be short.
    fn read_chunk(&self, location: FileLocation, name: &str, index: u64) -> Result<Vec<u8>>;

    /// Create or truncate a download target.
    fn create_download(&self, name: &str) -> Result<()>;

    /// Write chunk `index` of a download.
    fn write_chunk(&self, name: &str, index: u64, data: &[u8]) -> Result<()>;
}

/// Names are plain file names: no separators, no parent references.
pub fn check_file_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(FileError::InvalidName(name.to_owned()));
    }
    Ok(())
}
