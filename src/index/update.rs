use crate::index::build::component_words;
use crate::index::types::{EntryIndex, IndexConfig, IndexSnapshot, Root};
use crate::source::IndexSource;
use crate::utils::normalize_separators;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// An entry that changed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedEntry {
    pub from: String,
    pub to: String,
}

impl MovedEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A batch of entry changes for an incremental update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    /// Entries created or modified
    #[serde(default)]
    pub updated: Vec<String>,
    /// Entries deleted
    #[serde(default)]
    pub removed: Vec<String>,
    /// Entries renamed or moved
    #[serde(default)]
    pub moved: Vec<MovedEntry>,
}

impl ChangeBatch {
    /// Create a new empty change batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }

    /// Get total number of changes
    pub fn total_changes(&self) -> usize {
        self.updated.len() + self.removed.len() + self.moved.len()
    }

    pub fn updated(mut self, entry: impl Into<String>) -> Self {
        self.updated.push(entry.into());
        self
    }

    pub fn removed(mut self, entry: impl Into<String>) -> Self {
        self.removed.push(entry.into());
        self
    }

    pub fn moved(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.moved.push(MovedEntry::new(from, to));
        self
    }

    /// Merge another batch into this one
    pub fn merge(&mut self, other: ChangeBatch) {
        for entry in other.updated {
            if !self.updated.contains(&entry) {
                self.updated.push(entry);
            }
        }
        for entry in other.removed {
            // update + remove = remove
            self.updated.retain(|e| e != &entry);
            if !self.removed.contains(&entry) {
                self.removed.push(entry);
            }
        }
        self.moved.extend(other.moved);
    }
}

/// What an incremental update changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub added: usize,
    pub removed: usize,
}

impl UpdateSummary {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Resolve an incoming path to its index entry and root ordinal.
///
/// Roots are tried in order with the same mapping the builder applies to
/// enumerated entries, so a root with an empty base claims every path. A path
/// under no root is taken as relative to the first root and gets its logical
/// prefix.
pub fn resolve_entry(roots: &[Root], path: &str) -> Option<(String, usize)> {
    let normalized = normalize_separators(path);

    for (ordinal, root) in roots.iter().enumerate() {
        if let Some(entry) = root.map_entry(&normalized) {
            return Some((entry, ordinal));
        }
    }

    let relative = normalized.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }
    match roots.first() {
        Some(root) => Root::new("", root.logical_prefix.as_str())
            .map_entry(relative)
            .map(|entry| (entry, 0)),
        None => Some((relative.to_string(), 0)),
    }
}

/// Merge a change batch into `snapshot` in place.
///
/// Removals (including the old side of moves) go first, then additions. Only
/// paths not yet in the entry store are tokenized; a known path whose content
/// changed keeps its existing words. Removed entries keep their slots.
pub fn apply_changes<S: IndexSource + ?Sized>(
    snapshot: &mut IndexSnapshot,
    roots: &[Root],
    source: &S,
    config: &IndexConfig,
    batch: &ChangeBatch,
) -> UpdateSummary {
    let started = Instant::now();
    let mut summary = UpdateSummary::default();

    let mut removed = RoaringBitmap::new();
    let outgoing = batch
        .removed
        .iter()
        .chain(batch.moved.iter().map(|m| &m.from));
    for path in outgoing {
        let Some((entry, _)) = resolve_entry(roots, path) else {
            continue;
        };
        if let Some(index) = snapshot.entries.unlink(&entry) {
            removed.insert(index);
        }
    }
    if !removed.is_empty() {
        let words = snapshot.words.remove_entries(&removed);
        summary.removed = removed.len() as usize;
        tracing::debug!("removed {} entries ({} words)", summary.removed, words);
    }

    let incoming = batch
        .updated
        .iter()
        .chain(batch.moved.iter().map(|m| &m.to));
    for path in incoming {
        let Some((entry, ordinal)) = resolve_entry(roots, path) else {
            continue;
        };
        if source.should_skip(&entry) || snapshot.entries.contains(&entry) {
            continue;
        }

        let index = snapshot.entries.len() as EntryIndex;
        let components = source.split_components(&entry, index);
        let words = component_words(&components, index, config.base_score(ordinal), config);
        if words.is_empty() {
            tracing::debug!("skipping {}: no searchable words", entry);
            continue;
        }

        snapshot.entries.push(entry);
        for word in words {
            snapshot.words.insert(word);
        }
        summary.added += 1;
    }

    if !summary.is_empty() {
        tracing::info!(
            "incremental update: +{} -{} entries in {:?}",
            summary.added,
            summary.removed,
            started.elapsed()
        );
    }

    summary
}
