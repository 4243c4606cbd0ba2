//! Content index: files by metahash, and every servable hash to the file
//! and chunk it names.

use std::collections::HashMap;

use shared_types::{hash_to_hex, Hash, SearchResult};

use super::{chunk_hash, FileError, Result, SharedFile, SharedFileRef};

/// What a servable hash points at. Chunk `0` is the metafile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRef {
    pub metahash: Hash,
    pub chunk_index: u64,
}

#[derive(Default)]
pub struct FileIndex {
    files: HashMap<Hash, SharedFileRef>,
    hashes: HashMap<Hash, HashRef>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, metahash: &Hash) -> Option<SharedFileRef> {
        self.files.get(metahash).cloned()
    }

    /// Add a file that is not yet known.
    pub fn insert(&mut self, file: SharedFile) -> Result<SharedFileRef> {
        let metahash = file.metahash();
        if self.files.contains_key(&metahash) {
            return Err(FileError::AlreadyIndexed(hash_to_hex(&metahash)));
        }
        let file = file.into_ref();
        self.files.insert(metahash, file.clone());
        Ok(file)
    }

    /// Add a file whose metafile is known, making the metafile and every
    /// chunk it holds servable.
    pub fn insert_complete(&mut self, file: SharedFile) -> Result<SharedFileRef> {
        let refs: Vec<(Hash, u64)> = {
            let metafile = file.metafile().unwrap_or_default();
            file.downloaded_chunks()
                .iter()
                .filter_map(|&i| chunk_hash(metafile, i).map(|h| (h, i)))
                .collect()
        };
        let metahash = file.metahash();
        let file = self.insert(file)?;
        self.register_metafile(metahash);
        for (hash, index) in refs {
            self.register_chunk(metahash, hash, index);
        }
        Ok(file)
    }

    /// Forget a file. Its hashes stop resolving.
    pub fn remove(&mut self, metahash: &Hash) -> Option<SharedFileRef> {
        let file = self.files.remove(metahash)?;
        self.hashes.retain(|_, href| href.metahash != *metahash);
        Some(file)
    }

    pub fn register_metafile(&mut self, metahash: Hash) {
        self.hashes.insert(
            metahash,
            HashRef {
                metahash,
                chunk_index: 0,
            },
        );
    }

    pub fn register_chunk(&mut self, metahash: Hash, chunk: Hash, chunk_index: u64) {
        self.hashes.insert(chunk, HashRef { metahash, chunk_index });
    }

    /// Resolve a requested hash.
    pub fn lookup(&self, hash: &Hash) -> Option<(SharedFileRef, u64)> {
        let href = self.hashes.get(hash)?;
        let file = self.files.get(&href.metahash)?;
        Some((file.clone(), href.chunk_index))
    }

    /// Files whose name contains any keyword and which we can describe.
    pub fn search(&self, keywords: &[String]) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .files
            .values()
            .filter_map(|file| {
                let file = file.lock();
                let name = file.name();
                keywords
                    .iter()
                    .any(|k| !k.is_empty() && name.contains(k.as_str()))
                    .then(|| file.search_result())
                    .flatten()
            })
            .collect();
        results.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        results
    }

    /// Fold a search result from `origin` in. Returns the file and whether
    /// it just became a complete match.
    pub fn merge_search_result(&mut self, result: &SearchResult, origin: &str) -> (SharedFileRef, bool) {
        let file = self
            .files
            .entry(result.metafile_hash)
            .or_insert_with(|| SharedFile::search_match(result).into_ref())
            .clone();
        let completed = file.lock().update_chunk_mappings(&result.chunk_map, origin);
        (file, completed)
    }

    /// Snapshot of every known file.
    pub fn files(&self) -> Vec<SharedFileRef> {
        self.files.values().cloned().collect()
    }
}
