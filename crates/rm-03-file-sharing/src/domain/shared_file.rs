//! # Shared File
//!
//! One file known to this node, from a fully indexed local file to a bare
//! search match nobody has fetched yet.
//!
//! ## States
//!
//! ```text
//! UncompleteMatch ──(mappings cover all chunks)──→ CompleteMatch
//!                                                       │ begin_multi_source
//!                                                       ↓
//! NoMetafileMonoSource ──┐                    NoMetafileMultiSource
//!                        └──── set_metafile ────────────┘
//!                                   ↓
//!                             MissingChunks ──(last chunk)──→ Reconstructed
//! ```
//!
//! Local files start `Reconstructed`. An empty metafile jumps straight to
//! `Reconstructed`. Calling a transition from the wrong state is a bug in
//! the caller and panics.
//!
//! A download that gives up keeps what it fetched. Before the metafile a
//! multi-source download falls back to `CompleteMatch`; after it the file
//! stays in `MissingChunks`, marked stalled, until [`SharedFile::resume`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{Hash, SearchResult};

use super::{check_metafile, chunk_count_for_metafile, chunk_hash, Result};

/// Handle shared by the index and the download task of a file.
pub type SharedFileRef = Arc<Mutex<SharedFile>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Client asked for a download from one named peer.
    NoMetafileMonoSource,
    /// A complete match is being downloaded from several peers.
    NoMetafileMultiSource,
    /// Seen in search replies, some chunks have no known holder.
    UncompleteMatch,
    /// Every chunk has a known holder.
    CompleteMatch,
    MissingChunks,
    Reconstructed,
}

/// Where the bytes of a file live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileLocation {
    Shared,
    Downloads,
}

#[derive(Debug, Clone)]
pub struct SharedFile {
    name: String,
    metahash: Hash,
    metafile: Option<Vec<u8>>,
    chunk_count: u64,
    /// `have[i]` is chunk `i + 1`.
    have: Vec<bool>,
    /// Chunk indices in the order they arrived.
    downloaded: Vec<u64>,
    /// Chunk index to the peer that advertised it.
    remote_chunks: BTreeMap<u64, String>,
    state: FileState,
    location: FileLocation,
    mono_source: Option<String>,
    metafile_query_peer: Option<String>,
    /// No download task is working on the missing chunks.
    stalled: bool,
    invalid: bool,
}

impl SharedFile {
    /// A file indexed from the shared directory. Every chunk is present.
    pub fn local(name: impl Into<String>, metahash: Hash, metafile: Vec<u8>) -> Self {
        let chunk_count = chunk_count_for_metafile(metafile.len());
        Self {
            name: name.into(),
            metahash,
            metafile: Some(metafile),
            chunk_count,
            have: vec![true; chunk_count as usize],
            downloaded: (1..=chunk_count).collect(),
            remote_chunks: BTreeMap::new(),
            state: FileState::Reconstructed,
            location: FileLocation::Shared,
            mono_source: None,
            metafile_query_peer: None,
            stalled: false,
            invalid: false,
        }
    }

    /// A download of `metahash` from the single peer `source`.
    pub fn mono_source(name: impl Into<String>, metahash: Hash, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            name: name.into(),
            metahash,
            metafile: None,
            chunk_count: 0,
            have: Vec::new(),
            downloaded: Vec::new(),
            remote_chunks: BTreeMap::new(),
            state: FileState::NoMetafileMonoSource,
            location: FileLocation::Downloads,
            metafile_query_peer: Some(source.clone()),
            mono_source: Some(source),
            stalled: false,
            invalid: false,
        }
    }

    /// A file first seen in a search reply.
    pub fn search_match(result: &SearchResult) -> Self {
        Self {
            name: result.file_name.clone(),
            metahash: result.metafile_hash,
            metafile: None,
            chunk_count: result.chunk_count,
            // sized once the metafile is known
            have: Vec::new(),
            downloaded: Vec::new(),
            remote_chunks: BTreeMap::new(),
            state: FileState::UncompleteMatch,
            location: FileLocation::Downloads,
            mono_source: None,
            metafile_query_peer: None,
            stalled: false,
            invalid: false,
        }
    }

    /// A partial download found in the downloads directory. `held` lists
    /// the chunks already on disk.
    pub fn restored(name: impl Into<String>, metafile: Vec<u8>, held: &[u64]) -> Result<Self> {
        let mut file = Self {
            name: name.into(),
            metahash: super::metahash_of(&metafile),
            metafile: None,
            chunk_count: 0,
            have: Vec::new(),
            downloaded: Vec::new(),
            remote_chunks: BTreeMap::new(),
            state: FileState::NoMetafileMonoSource,
            location: FileLocation::Downloads,
            mono_source: None,
            metafile_query_peer: None,
            stalled: false,
            invalid: false,
        };
        if !file.set_metafile(metafile)? {
            file.restore_chunks(held);
        }
        file.stalled = !file.is_reconstructed();
        Ok(file)
    }

    pub fn into_ref(self) -> SharedFileRef {
        Arc::new(Mutex::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metahash(&self) -> Hash {
        self.metahash
    }

    pub fn metafile(&self) -> Option<&[u8]> {
        self.metafile.as_deref()
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn location(&self) -> FileLocation {
        self.location
    }

    pub fn is_reconstructed(&self) -> bool {
        self.state == FileState::Reconstructed
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn has_chunk(&self, index: u64) -> bool {
        index >= 1 && self.have.get(index as usize - 1).copied().unwrap_or(false)
    }

    pub fn downloaded_chunks(&self) -> &[u64] {
        &self.downloaded
    }

    pub fn metafile_query_peer(&self) -> Option<&str> {
        self.metafile_query_peer.as_deref()
    }

    /// Hash of chunk `index` once the metafile is known.
    pub fn chunk_hash(&self, index: u64) -> Option<Hash> {
        chunk_hash(self.metafile.as_deref()?, index)
    }

    /// First chunk not yet held.
    pub fn next_missing_chunk(&self) -> Option<u64> {
        if self.state != FileState::MissingChunks {
            return None;
        }
        self.have.iter().position(|have| !have).map(|i| i as u64 + 1)
    }

    /// Peer to ask for chunk `index`.
    pub fn chunk_source(&self, index: u64) -> Option<&str> {
        match &self.mono_source {
            Some(source) => Some(source.as_str()),
            None => self.remote_chunks.get(&index).map(String::as_str),
        }
    }

    /// Install the verified metafile. Returns `true` when the file turns out
    /// to be empty and is therefore already reconstructed.
    ///
    /// # Panics
    ///
    /// If the metafile is already known.
    pub fn set_metafile(&mut self, metafile: Vec<u8>) -> Result<bool> {
        assert!(
            matches!(
                self.state,
                FileState::NoMetafileMonoSource | FileState::NoMetafileMultiSource
            ),
            "metafile set on {} in state {:?}",
            self.name,
            self.state
        );
        check_metafile(&metafile)?;
        let chunk_count = chunk_count_for_metafile(metafile.len());
        if self.state == FileState::NoMetafileMultiSource && chunk_count != self.chunk_count {
            return Err(super::FileError::InvalidMetafile(metafile.len()));
        }
        self.chunk_count = chunk_count;
        self.have = vec![false; chunk_count as usize];
        self.downloaded.clear();
        self.metafile = Some(metafile);
        self.state = if chunk_count == 0 {
            FileState::Reconstructed
        } else {
            FileState::MissingChunks
        };
        Ok(self.is_reconstructed())
    }

    /// Record that chunk `index` has been written. Returns `true` when it
    /// was the last missing one.
    ///
    /// # Panics
    ///
    /// On an index out of range, a chunk already held, or a file that is not
    /// downloading.
    pub fn record_chunk(&mut self, index: u64) -> bool {
        assert_eq!(
            self.state,
            FileState::MissingChunks,
            "chunk {index} written to {} in the wrong state",
            self.name
        );
        assert!(
            index >= 1 && index <= self.chunk_count,
            "chunk {index} out of range for {}",
            self.name
        );
        let slot = &mut self.have[index as usize - 1];
        assert!(!*slot, "chunk {index} of {} written twice", self.name);
        *slot = true;
        self.downloaded.push(index);
        self.remote_chunks.remove(&index);
        if self.have.iter().all(|have| *have) {
            self.state = FileState::Reconstructed;
            return true;
        }
        false
    }

    fn restore_chunks(&mut self, indices: &[u64]) {
        for &index in indices {
            let in_range = index >= 1 && index <= self.chunk_count;
            if in_range && !self.has_chunk(index) && self.record_chunk(index) {
                return;
            }
        }
    }

    /// Merge a search result's chunk map from `origin`. Returns `true` when
    /// the file just became a complete match.
    ///
    /// A stalled multi-source download takes `origin` as the new holder of
    /// the chunks it still misses.
    pub fn update_chunk_mappings(&mut self, chunk_map: &[u64], origin: &str) -> bool {
        if self.stalled && self.mono_source.is_none() {
            for &index in chunk_map {
                if index >= 1 && index <= self.chunk_count && !self.has_chunk(index) {
                    self.remote_chunks.insert(index, origin.to_owned());
                }
            }
            return false;
        }
        if self.state != FileState::UncompleteMatch && self.state != FileState::CompleteMatch {
            return false;
        }
        for &index in chunk_map {
            if index >= 1 && index <= self.chunk_count {
                self.remote_chunks
                    .entry(index)
                    .or_insert_with(|| origin.to_owned());
            }
        }
        if self.state == FileState::UncompleteMatch
            && self.remote_chunks.len() as u64 == self.chunk_count
        {
            self.state = FileState::CompleteMatch;
            self.metafile_query_peer = Some(origin.to_owned());
            return true;
        }
        false
    }

    /// Start a multi-source download saved as `name`. Returns the peer to
    /// ask for the metafile.
    ///
    /// # Panics
    ///
    /// Unless the file is a complete match.
    pub fn begin_multi_source(&mut self, name: impl Into<String>) -> String {
        assert_eq!(self.state, FileState::CompleteMatch, "{} is not a complete match", self.name);
        self.name = name.into();
        self.state = FileState::NoMetafileMultiSource;
        self.metafile_query_peer.clone().unwrap_or_default()
    }

    /// The download task gave up. Returns `false` when nothing was fetched
    /// and the entry has no reason to stay.
    pub fn abort_download(&mut self) -> bool {
        match self.state {
            FileState::NoMetafileMonoSource => false,
            FileState::NoMetafileMultiSource => {
                self.state = FileState::CompleteMatch;
                true
            }
            FileState::MissingChunks => {
                self.stalled = true;
                true
            }
            _ => true,
        }
    }

    /// Hand a stalled download to a new task, fetching from `source` alone
    /// when given, from the mapped holders otherwise. Returns `false` unless
    /// the file was stalled.
    pub fn resume(&mut self, source: Option<String>) -> bool {
        if !std::mem::replace(&mut self.stalled, false) {
            return false;
        }
        if source.is_some() {
            self.mono_source = source;
        }
        true
    }

    /// What this node can offer to a search. Nothing before the metafile
    /// is known.
    pub fn search_result(&self) -> Option<SearchResult> {
        if self.metafile.is_none() || self.invalid {
            return None;
        }
        let mut chunk_map = self.downloaded.clone();
        chunk_map.sort_unstable();
        Some(SearchResult {
            file_name: self.name.clone(),
            metafile_hash: self.metahash,
            chunk_map,
            chunk_count: self.chunk_count,
        })
    }

    /// The chain says this name belongs to another file.
    pub fn invalidate(&mut self) -> bool {
        !std::mem::replace(&mut self.invalid, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_metafile, metahash_of, FileError};

    fn two_chunk_metafile() -> Vec<u8> {
        build_metafile(&vec![1u8; 10_000])
    }

    #[test]
    fn test_local_file_is_reconstructed() {
        let metafile = two_chunk_metafile();
        let file = SharedFile::local("a.txt", metahash_of(&metafile), metafile);
        assert!(file.is_reconstructed());
        assert_eq!(file.chunk_count(), 2);
        assert_eq!(file.search_result().unwrap().chunk_map, vec![1, 2]);
        assert_eq!(file.location(), FileLocation::Shared);
    }

    #[test]
    fn test_mono_source_download_lifecycle() {
        let metafile = two_chunk_metafile();
        let mut file = SharedFile::mono_source("copy.txt", metahash_of(&metafile), "B");
        assert_eq!(file.state(), FileState::NoMetafileMonoSource);
        assert!(file.search_result().is_none());

        assert!(!file.set_metafile(metafile).unwrap());
        assert_eq!(file.state(), FileState::MissingChunks);
        assert_eq!(file.next_missing_chunk(), Some(1));
        assert_eq!(file.chunk_source(2), Some("B"));

        assert!(!file.record_chunk(1));
        assert_eq!(file.search_result().unwrap().chunk_map, vec![1]);
        assert!(file.record_chunk(2));
        assert!(file.is_reconstructed());
        assert_eq!(file.next_missing_chunk(), None);
    }

    #[test]
    fn test_empty_metafile_reconstructs_immediately() {
        let mut file = SharedFile::mono_source("empty", metahash_of(&[]), "B");
        assert!(file.set_metafile(Vec::new()).unwrap());
        assert!(file.is_reconstructed());
        assert_eq!(file.chunk_count(), 0);
    }

    #[test]
    fn test_malformed_metafile_rejected() {
        let mut file = SharedFile::mono_source("x", [0u8; 32], "B");
        assert!(matches!(file.set_metafile(vec![0; 31]), Err(FileError::InvalidMetafile(31))));
        assert_eq!(file.state(), FileState::NoMetafileMonoSource);
    }

    #[test]
    #[should_panic(expected = "metafile set")]
    fn test_metafile_set_twice_panics() {
        let metafile = two_chunk_metafile();
        let mut file = SharedFile::mono_source("x", metahash_of(&metafile), "B");
        file.set_metafile(metafile.clone()).unwrap();
        let _ = file.set_metafile(metafile);
    }

    #[test]
    #[should_panic(expected = "written twice")]
    fn test_chunk_written_twice_panics() {
        let metafile = two_chunk_metafile();
        let mut file = SharedFile::mono_source("x", metahash_of(&metafile), "B");
        file.set_metafile(metafile).unwrap();
        file.record_chunk(1);
        file.record_chunk(1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_chunk_out_of_range_panics() {
        let metafile = two_chunk_metafile();
        let mut file = SharedFile::mono_source("x", metahash_of(&metafile), "B");
        file.set_metafile(metafile).unwrap();
        file.record_chunk(3);
    }

    #[test]
    fn test_chunk_mappings_complete_the_match() {
        let result = SearchResult {
            file_name: "song.mp3".into(),
            metafile_hash: [5u8; 32],
            chunk_map: vec![1, 2, 3],
            chunk_count: 6,
        };
        let mut file = SharedFile::search_match(&result);
        assert!(!file.update_chunk_mappings(&result.chunk_map, "A"));
        assert_eq!(file.state(), FileState::UncompleteMatch);

        // out-of-range indices are ignored
        assert!(file.update_chunk_mappings(&[4, 5, 6, 9], "B"));
        assert_eq!(file.state(), FileState::CompleteMatch);
        assert_eq!(file.metafile_query_peer(), Some("B"));
        assert_eq!(file.chunk_source(2), Some("A"));
        assert_eq!(file.chunk_source(5), Some("B"));

        // only the transition reports true
        assert!(!file.update_chunk_mappings(&[1], "C"));

        assert_eq!(file.begin_multi_source("local.mp3"), "B");
        assert_eq!(file.name(), "local.mp3");
        assert_eq!(file.state(), FileState::NoMetafileMultiSource);
    }

    #[test]
    fn test_multi_source_metafile_must_match_chunk_count() {
        let result = SearchResult {
            file_name: "f".into(),
            metafile_hash: [5u8; 32],
            chunk_map: vec![1, 2, 3],
            chunk_count: 3,
        };
        let mut file = SharedFile::search_match(&result);
        file.update_chunk_mappings(&result.chunk_map, "A");
        file.begin_multi_source("f");
        assert!(file.set_metafile(two_chunk_metafile()).is_err());
    }

    #[test]
    fn test_aborted_mono_download_resumes_where_it_stopped() {
        let metafile = two_chunk_metafile();
        let mut file = SharedFile::mono_source("copy", metahash_of(&metafile), "B");
        assert!(!file.resume(Some("B".into())));
        file.set_metafile(metafile).unwrap();
        file.record_chunk(1);

        assert!(file.abort_download());
        assert!(file.is_stalled());
        assert_eq!(file.state(), FileState::MissingChunks);
        assert!(file.resume(Some("C".into())));
        assert!(!file.resume(Some("C".into())));
        assert_eq!(file.next_missing_chunk(), Some(2));
        assert_eq!(file.chunk_source(2), Some("C"));
    }

    #[test]
    fn test_aborted_multi_source_download_is_retryable() {
        let result = SearchResult {
            file_name: "f".into(),
            metafile_hash: [5u8; 32],
            chunk_map: vec![1, 2],
            chunk_count: 2,
        };
        let mut file = SharedFile::search_match(&result);
        file.update_chunk_mappings(&result.chunk_map, "A");
        file.begin_multi_source("f");
        assert!(file.abort_download());
        assert_eq!(file.state(), FileState::CompleteMatch);
        assert_eq!(file.begin_multi_source("f"), "A");

        file.set_metafile(two_chunk_metafile()).unwrap();
        file.record_chunk(1);
        assert!(file.abort_download());
        // a later reply moves the missing chunk to another holder
        assert!(!file.update_chunk_mappings(&[1, 2], "B"));
        assert_eq!(file.chunk_source(1), None);
        assert_eq!(file.chunk_source(2), Some("B"));
        assert!(file.resume(None));
        assert_eq!(file.next_missing_chunk(), Some(2));
    }

    #[test]
    fn test_nothing_fetched_is_dropped_on_abort() {
        let mut file = SharedFile::mono_source("x", [1u8; 32], "B");
        assert!(!file.abort_download());
    }

    #[test]
    fn test_invalidate_hides_from_search() {
        let metafile = two_chunk_metafile();
        let mut file = SharedFile::local("a.txt", metahash_of(&metafile), metafile);
        assert!(file.invalidate());
        assert!(!file.invalidate());
        assert!(file.is_invalid());
        assert!(file.search_result().is_none());
    }

    #[test]
    fn test_restored_partial_download() {
        let metafile = two_chunk_metafile();
        let file = SharedFile::restored("x", metafile.clone(), &[2, 2, 7]).unwrap();
        assert_eq!(file.metahash(), metahash_of(&metafile));
        assert_eq!(file.state(), FileState::MissingChunks);
        assert!(file.has_chunk(2));
        assert!(!file.has_chunk(1));
        assert_eq!(file.next_missing_chunk(), Some(1));
        assert!(file.is_stalled());
    }
}
