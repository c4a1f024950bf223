use crate::index::types::EntryIndex;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

/// Append-only store of entry identifiers.
///
/// Positions are stable for the lifetime of one generation. Removing an entry
/// only unlinks its path so a later re-add gets a fresh slot; the slot itself
/// is never reused or compacted.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Vec<String>,
    positions: FxHashMap<String, EntryIndex>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Rebuild a store from persisted slots.
    ///
    /// Only slots in `live` are linked; unlinked slots are not persisted as
    /// such, so liveness is recovered from the word index.
    pub fn from_slots(entries: Vec<String>, live: &RoaringBitmap) -> Self {
        let mut positions = FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
        for (index, entry) in entries.iter().enumerate() {
            if live.contains(index as u32) {
                positions.insert(entry.clone(), index as EntryIndex);
            }
        }
        Self { entries, positions }
    }

    /// Append an entry, returning its position
    pub fn push(&mut self, entry: impl Into<String>) -> EntryIndex {
        let entry = entry.into();
        let index = self.entries.len() as EntryIndex;
        self.positions.insert(entry.clone(), index);
        self.entries.push(entry);
        index
    }

    /// Entry stored at `index`, including unlinked slots
    pub fn get(&self, index: EntryIndex) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }

    /// Position of a live entry
    pub fn position(&self, entry: &str) -> Option<EntryIndex> {
        self.positions.get(entry).copied()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.positions.contains_key(entry)
    }

    /// Unlink a live entry, keeping its slot
    pub fn unlink(&mut self, entry: &str) -> Option<EntryIndex> {
        self.positions.remove(entry)
    }

    /// Number of slots (live and unlinked)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live entries
    pub fn live_count(&self) -> usize {
        self.positions.len()
    }

    /// All slots in position order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

// Slots only: liveness of slots without words is not persisted
impl PartialEq for EntryStore {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<String> for EntryStore {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut store = EntryStore::new();
        for entry in iter {
            store.push(entry);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_lookup() {
        let mut store = EntryStore::new();
        assert_eq!(store.push("a.cs"), 0);
        assert_eq!(store.push("b.cs"), 1);
        assert_eq!(store.get(1), Some("b.cs"));
        assert_eq!(store.position("a.cs"), Some(0));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unlink_keeps_slot() {
        let mut store: EntryStore = ["a.cs".to_string(), "b.cs".to_string()].into_iter().collect();
        assert_eq!(store.unlink("a.cs"), Some(0));
        assert!(!store.contains("a.cs"));
        assert_eq!(store.get(0), Some("a.cs"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.live_count(), 1);

        // Re-adding appends a fresh slot
        assert_eq!(store.push("a.cs"), 2);
        assert_eq!(store.position("a.cs"), Some(2));
    }

    #[test]
    fn test_from_slots_links_live_only() {
        let live: RoaringBitmap = [1u32].into_iter().collect();
        let store = EntryStore::from_slots(vec!["a.cs".into(), "b.cs".into()], &live);
        assert!(!store.contains("a.cs"));
        assert_eq!(store.position("b.cs"), Some(1));
        assert_eq!(store.get(0), Some("a.cs"));
    }
}
