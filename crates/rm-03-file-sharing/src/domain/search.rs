//! Search bookkeeping: loop suppression, budget splitting and the
//! full-match counters of searches this node started.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use shared_crypto::Sha256Hasher;
use shared_types::{Hash, SearchResult, MAX_CHUNKS_PER_FILE};

/// Fingerprint of a search request for duplicate suppression.
pub fn search_fingerprint(origin: &str, keywords: &[String]) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update(origin.as_bytes());
    for keyword in keywords {
        hasher.update(b",").update(keyword.as_bytes());
    }
    hasher.finalize()
}

/// Split `budget` over `neighbors` peers: each gets `budget / n`, and the
/// first `budget % n` get one more. Peers that would get zero are left out.
pub fn split_budget(budget: u64, neighbors: usize) -> Vec<u64> {
    if neighbors == 0 || budget == 0 {
        return Vec::new();
    }
    let n = neighbors as u64;
    let (base, excess) = (budget / n, budget % n);
    (0..n)
        .map(|i| base + u64::from(i < excess))
        .filter(|share| *share > 0)
        .collect()
}

/// A peer's search result cut down to what a file can hold: the chunk map
/// sorted, deduplicated and limited to `1..=chunk_count`. `None` when the
/// chunk count is larger than any file.
pub fn sanitize_result(result: &SearchResult) -> Option<SearchResult> {
    if result.chunk_count > MAX_CHUNKS_PER_FILE as u64 {
        return None;
    }
    let chunk_map: BTreeSet<u64> = result
        .chunk_map
        .iter()
        .copied()
        .filter(|index| *index >= 1 && *index <= result.chunk_count)
        .collect();
    Some(SearchResult {
        chunk_map: chunk_map.into_iter().collect(),
        ..result.clone()
    })
}

fn names_keyword(keywords: &[String], file_name: &str) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && file_name.contains(k.as_str()))
}

/// Searches seen within the last `window`.
pub struct RecentSearches {
    window: Duration,
    seen: HashMap<Hash, Instant>,
}

impl RecentSearches {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// Record `fingerprint` at `now`. Returns `false` for a repeat inside
    /// the window.
    pub fn observe(&mut self, fingerprint: Hash, now: Instant) -> bool {
        let window = self.window;
        self.seen
            .retain(|_, seen_at| now.saturating_duration_since(*seen_at) < window);
        if self.seen.contains_key(&fingerprint) {
            return false;
        }
        self.seen.insert(fingerprint, now);
        true
    }
}

/// Distinct full matches per running search.
#[derive(Default)]
pub struct TotalMatches {
    searches: HashMap<String, (Vec<String>, BTreeSet<(String, String)>)>,
}

impl TotalMatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword order does not matter.
    pub fn key(keywords: &[String]) -> String {
        let mut sorted = keywords.to_vec();
        sorted.sort_unstable();
        sorted.join(",")
    }

    /// Begin counting for `keywords`, forgetting an earlier run.
    pub fn start(&mut self, keywords: &[String]) {
        self.searches
            .insert(Self::key(keywords), (keywords.to_vec(), BTreeSet::new()));
    }

    /// Count a full match of `file_name` at `origin` against every running
    /// search with a keyword in the name.
    pub fn record(&mut self, origin: &str, file_name: &str) {
        for (keywords, matches) in self.searches.values_mut() {
            if names_keyword(keywords, file_name) {
                matches.insert((origin.to_owned(), file_name.to_owned()));
            }
        }
    }

    /// Some search is running.
    pub fn is_active(&self) -> bool {
        !self.searches.is_empty()
    }

    /// `file_name` answers one of the running searches.
    pub fn expects(&self, file_name: &str) -> bool {
        self.searches
            .values()
            .any(|(keywords, _)| names_keyword(keywords, file_name))
    }

    pub fn count(&self, keywords: &[String]) -> usize {
        self.searches
            .get(&Self::key(keywords))
            .map_or(0, |(_, matches)| matches.len())
    }

    pub fn finish(&mut self, keywords: &[String]) {
        self.searches.remove(&Self::key(keywords));
    }
}
