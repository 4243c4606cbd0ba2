//! In-process file store.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared_types::CHUNK_SIZE;

use crate::domain::{FileError, FileLocation, Result};
use crate::ports::{check_file_name, FileStore};

#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<(FileLocation, String), Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a file in the shared directory.
    pub fn put_shared(&self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files
            .write()
            .insert((FileLocation::Shared, name.into()), content.into());
    }

    /// Content of a download, if it exists.
    pub fn download(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .get(&(FileLocation::Downloads, name.to_owned()))
            .cloned()
    }
}

impl FileStore for MemoryFileStore {
    fn read_file(&self, location: FileLocation, name: &str) -> Result<Vec<u8>> {
        check_file_name(name)?;
        self.files
            .read()
            .get(&(location, name.to_owned()))
            .cloned()
            .ok_or_else(|| FileError::NotFound(name.to_owned()))
    }

    fn read_chunk(&self, location: FileLocation, name: &str, index: u64) -> Result<Vec<u8>> {
        let content = self.read_file(location, name)?;
        let start = (index.saturating_sub(1) as usize * CHUNK_SIZE).min(content.len());
        let end = (start + CHUNK_SIZE).min(content.len());
        Ok(content[start..end].to_vec())
    }

    fn create_download(&self, name: &str) -> Result<()> {
        check_file_name(name)?;
        self.files
            .write()
            .insert((FileLocation::Downloads, name.to_owned()), Vec::new());
        Ok(())
    }

    fn write_chunk(&self, name: &str, index: u64, data: &[u8]) -> Result<()> {
        check_file_name(name)?;
        let start = index
            .checked_sub(1)
            .map(|i| i as usize * CHUNK_SIZE)
            .ok_or_else(|| FileError::InvalidName(format!("{name}#0")))?;
        let mut files = self.files.write();
        let content = files
            .entry((FileLocation::Downloads, name.to_owned()))
            .or_default();
        if content.len() < start + data.len() {
            content.resize(start + data.len(), 0);
        }
        content[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_chunks() {
        let store = MemoryFileStore::new();
        store.put_shared("a", vec![9u8; CHUNK_SIZE + 1]);
        assert_eq!(store.read_chunk(FileLocation::Shared, "a", 2).unwrap(), vec![9u8]);

        store.write_chunk("b", 2, b"xy").unwrap();
        assert_eq!(store.download("b").unwrap().len(), CHUNK_SIZE + 2);
        assert!(store.read_file(FileLocation::Downloads, "missing").is_err());
    }
}
