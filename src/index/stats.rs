use crate::index::types::{IndexSnapshot, Score, WordIndexEntry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Summary of one published snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    pub base_path: String,
    /// Entry slots, including removed ones
    pub entry_slots: usize,
    pub live_entries: usize,
    pub words: usize,
    /// Distinct `(length, key)` pairs
    pub distinct_keys: usize,
    /// Word count per prefix length
    pub words_by_length: BTreeMap<u32, usize>,
    pub min_score: Option<Score>,
    pub max_score: Option<Score>,
    /// Size of the snapshot once encoded
    pub encoded_bytes: u64,
}

impl IndexStats {
    pub fn from_snapshot(snapshot: &IndexSnapshot) -> Self {
        let mut stats = IndexStats {
            base_path: snapshot.base_path.clone(),
            entry_slots: snapshot.entries.len(),
            live_entries: snapshot.entries.live_count(),
            words: snapshot.words.len(),
            ..Default::default()
        };

        let mut last_key = None;
        for word in snapshot.words.iter() {
            if last_key != Some(word.sort_key()) {
                stats.distinct_keys += 1;
                last_key = Some(word.sort_key());
            }
            *stats.words_by_length.entry(word.length).or_insert(0) += 1;
            stats.min_score = Some(stats.min_score.map_or(word.score, |s| s.min(word.score)));
            stats.max_score = Some(stats.max_score.map_or(word.score, |s| s.max(word.score)));
        }

        // version + base path + counts + strings + fixed-size words
        let strings: usize = snapshot.entries.iter().map(|e| 4 + e.len()).sum();
        stats.encoded_bytes = (4
            + 4
            + snapshot.base_path.len()
            + 4
            + strings
            + 4
            + snapshot.words.len() * WordIndexEntry::SIZE) as u64;

        stats
    }
}

/// Display index statistics
pub fn show_stats(stats: &IndexStats, index_path: Option<&Path>) {
    println!("Index Statistics");
    println!("================");
    println!();
    println!("Built for:        {}", stats.base_path);
    if let Some(path) = index_path {
        println!("Index location:   {}", path.display());
    }
    println!("Entries:          {}", stats.live_entries);
    println!("Entry slots:      {}", stats.entry_slots);
    println!("Words:            {}", stats.words);
    println!("Distinct keys:    {}", stats.distinct_keys);
    if let (Some(min), Some(max)) = (stats.min_score, stats.max_score) {
        println!("Score range:      {}..={}", min, max);
    }

    println!();
    println!("Words by prefix length:");
    for (length, count) in &stats.words_by_length {
        println!("  {:3} {}", length, count);
    }

    println!();
    println!("Encoded size:     {}", format_size(stats.encoded_bytes));
    if let Some(size) = index_path.and_then(|p| std::fs::metadata(p).ok()).map(|m| m.len()) {
        println!("On disk:          {}", format_size(size));
    }
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
