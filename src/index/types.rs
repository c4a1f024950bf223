use crate::index::entries::EntryStore;
use crate::index::words::WordIndex;
use crate::utils::normalize_separators;
use serde::{Deserialize, Serialize};

/// Stable position of an entry within one index generation
pub type EntryIndex = u32;

/// Relevance score, lower is better
pub type Score = i32;

/// Default upper bound for lookups (nothing filtered)
pub const MAX_SCORE: Score = Score::MAX;

/// One `(hash, length, entry, score)` tuple of the word index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordIndexEntry {
    /// Hash of the token prefix
    pub key: i32,
    /// Prefix length in characters
    pub length: u32,
    pub entry_index: EntryIndex,
    pub score: Score,
}

impl WordIndexEntry {
    /// Size of an encoded entry in bytes
    pub const SIZE: usize = 4 + 4 + 4 + 4;

    pub fn new(key: i32, length: u32, entry_index: EntryIndex, score: Score) -> Self {
        Self {
            key,
            length,
            entry_index,
            score,
        }
    }

    /// Sort key of the word index
    #[inline]
    pub fn sort_key(&self) -> (u32, i32) {
        (self.length, self.key)
    }
}

/// One corpus segment combined into the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    /// Base path stripped from enumerated entries
    pub base_path: String,
    /// Prefix prepended to retained entries (may be empty)
    #[serde(default)]
    pub logical_prefix: String,
}

impl Root {
    pub fn new(base_path: impl Into<String>, logical_prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            logical_prefix: logical_prefix.into(),
        }
    }

    /// Root with no logical prefix
    pub fn bare(base_path: impl Into<String>) -> Self {
        Self::new(base_path, "")
    }

    /// Map a raw entry into this root.
    ///
    /// Returns `None` when the entry is not under `base_path`. Separators must
    /// already be normalized.
    pub fn map_entry(&self, entry: &str) -> Option<String> {
        let base = normalize_separators(&self.base_path);
        let base = base.trim_end_matches('/');
        let relative = if base.is_empty() {
            entry
        } else {
            let rest = entry.strip_prefix(base)?;
            if !rest.is_empty() && !rest.starts_with('/') {
                // "Assets2/x" is not under "Assets"
                return None;
            }
            rest
        };
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }

        let prefix = self.logical_prefix.trim_end_matches('/');
        Some(if prefix.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", prefix, relative)
        })
    }
}

/// Configuration for building and querying an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Shortest indexed prefix (and shortest usable query token)
    pub min_char_variation: usize,
    /// Longest indexed prefix, longer query tokens are clipped
    pub max_char_variation: usize,
    /// Base score added per root, in root order
    pub root_score_step: Score,
    /// Characters splitting query text into tokens
    pub separators: String,
    /// Globs for entries the filesystem source skips
    pub skip_globs: Vec<String>,
    /// Persist snapshots after a full build
    pub persist: bool,
    /// Persist snapshots after an incremental update
    pub persist_on_update: bool,
    /// Number of cached query results (0 disables the cache)
    pub query_cache_size: usize,
    /// Stop indexing a root after this many entries (0 = unlimited)
    pub max_entries: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_char_variation: 2,
            max_char_variation: 8,
            root_score_step: 100,
            separators: " /\\_-.,:;".to_string(),
            skip_globs: vec![
                ".git/**".to_string(),
                "**/.git/**".to_string(),
                "**/*.meta".to_string(),
                "**/*.tmp".to_string(),
            ],
            persist: true,
            persist_on_update: true,
            query_cache_size: 64,
            max_entries: 0,
        }
    }
}

impl IndexConfig {
    /// Config with the given prefix bounds and defaults elsewhere
    pub fn with_variations(min: usize, max: usize) -> Self {
        Self {
            min_char_variation: min,
            max_char_variation: max,
            ..Self::default()
        }
        .normalized()
    }

    /// Clamp the prefix bounds into a usable range
    pub fn normalized(mut self) -> Self {
        self.min_char_variation = self.min_char_variation.max(1);
        self.max_char_variation = self.max_char_variation.max(self.min_char_variation);
        self
    }

    /// Base score of the root at `ordinal`
    pub fn base_score(&self, ordinal: usize) -> Score {
        (ordinal as Score).saturating_mul(self.root_score_step)
    }
}

/// An entry store and word index published together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    /// Identity of the roots and bounds the snapshot was built for
    pub base_path: String,
    pub entries: EntryStore,
    pub words: WordIndex,
}

impl IndexSnapshot {
    pub fn new(base_path: impl Into<String>, entries: EntryStore, words: WordIndex) -> Self {
        Self {
            base_path: base_path.into(),
            entries,
            words,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.words.is_empty()
    }
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Entry identifier (path)
    pub entry: String,
    pub entry_index: EntryIndex,
    pub score: Score,
}
