//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use pfx::index::{EntryIndex, IndexConfig, Root};
use pfx::source::IndexSource;
use pfx::utils::{index_file_path, split_components};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// A latch the source blocks on while enumerating
#[derive(Default)]
pub struct Gate {
    closed: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    pub fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }

    pub fn open(&self) {
        *self.closed.lock().unwrap() = false;
        self.changed.notify_all();
    }

    fn pass(&self) {
        let mut closed = self.closed.lock().unwrap();
        while *closed {
            closed = self.changed.wait(closed).unwrap();
        }
    }
}

/// In-memory source over a fixed list of raw entries
pub struct VecSource {
    entries: Vec<String>,
    index_dir: Option<PathBuf>,
    pub enumerations: Arc<AtomicUsize>,
    pub gate: Arc<Gate>,
}

impl VecSource {
    pub fn new(entries: &[&str]) -> Self {
        Self {
            entries: entries.iter().map(|e| e.to_string()).collect(),
            index_dir: None,
            enumerations: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(Gate::default()),
        }
    }

    /// Persist snapshots under `dir`
    pub fn persisted(mut self, dir: &Path) -> Self {
        self.index_dir = Some(dir.to_path_buf());
        self
    }

    pub fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl IndexSource for VecSource {
    fn enumerate(&self, _root: &Root) -> Vec<String> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.gate.pass();
        self.entries.clone()
    }

    fn should_skip(&self, entry: &str) -> bool {
        entry.ends_with(".meta")
    }

    fn split_components(&self, entry: &str, _entry_index: EntryIndex) -> Vec<String> {
        split_components(entry)
    }

    fn resolve_index_path(&self, base_path: &str, is_temp: bool) -> Option<PathBuf> {
        self.index_dir
            .as_ref()
            .map(|dir| index_file_path(dir, base_path, is_temp))
    }
}

/// Config used by the scenarios: prefixes of 2..=8 characters
pub fn config() -> IndexConfig {
    IndexConfig::with_variations(2, 8)
}

/// Entries of a hit list
pub fn entries(hits: &[pfx::index::SearchHit]) -> Vec<&str> {
    hits.iter().map(|h| h.entry.as_str()).collect()
}
