use crate::index::types::{EntryIndex, Score, WordIndexEntry};
use roaring::RoaringBitmap;

/// Sorted array of word entries, searchable by `(length, key)`.
///
/// Invariant: entries are sorted ascending by `(length, key)` and no two
/// entries share `(key, length, entry_index)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordIndex {
    entries: Vec<WordIndexEntry>,
}

impl WordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unsorted entries, restoring the invariant
    pub fn from_unsorted(entries: Vec<WordIndexEntry>) -> Self {
        let mut index = Self { entries };
        index.sort_and_dedup();
        index
    }

    /// Wrap entries that are already sorted and deduplicated
    pub(crate) fn from_sorted(entries: Vec<WordIndexEntry>) -> Self {
        Self { entries }
    }

    /// Sort by `(length, key)` and drop duplicate `(key, length, entry)`
    /// tuples, keeping the lowest score.
    ///
    /// Ties keep their discovery order: entries of one key stay grouped by
    /// entry index in ascending order.
    pub fn sort_and_dedup(&mut self) {
        self.entries
            .sort_by_key(|e| (e.length, e.key, e.entry_index, e.score));
        self.entries
            .dedup_by(|b, a| a.length == b.length && a.key == b.key && a.entry_index == b.entry_index);
    }

    /// Range of entries sharing `(length, key)`
    fn key_range(&self, key: i32, length: u32) -> std::ops::Range<usize> {
        let target = (length, key);
        let start = self.entries.partition_point(|e| e.sort_key() < target);
        let len = self.entries[start..].partition_point(|e| e.sort_key() == target);
        start..start + len
    }

    /// All entries matching a token hash and length with `score < max_score`
    pub fn lookup(&self, key: i32, length: u32, max_score: Score) -> Vec<(EntryIndex, Score)> {
        let range = self.key_range(key, length);
        self.entries[range]
            .iter()
            .filter(|e| e.score < max_score)
            .map(|e| (e.entry_index, e.score))
            .collect()
    }

    /// Insert one entry at its sorted position.
    ///
    /// A duplicate `(key, length, entry)` keeps the lower score. New entries go
    /// after existing entries of the same key.
    pub fn insert(&mut self, word: WordIndexEntry) {
        let range = self.key_range(word.key, word.length);
        if let Some(existing) = self.entries[range.clone()]
            .iter_mut()
            .find(|e| e.entry_index == word.entry_index)
        {
            existing.score = existing.score.min(word.score);
            return;
        }
        self.entries.insert(range.end, word);
    }

    /// Drop every entry referencing one of `removed`, returning the count
    pub fn remove_entries(&mut self, removed: &RoaringBitmap) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !removed.contains(e.entry_index));
        before - self.entries.len()
    }

    /// Whether the sort invariant holds
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].sort_key() <= w[1].sort_key())
    }

    /// Set of entry indices referenced by at least one word
    pub fn referenced_entries(&self) -> RoaringBitmap {
        self.entries.iter().map(|e| e.entry_index).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordIndexEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[WordIndexEntry] {
        &self.entries
    }
}
