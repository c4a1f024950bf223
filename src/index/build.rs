use crate::engine::CancellationToken;
use crate::index::entries::EntryStore;
use crate::index::types::{EntryIndex, IndexConfig, IndexSnapshot, Root, Score, WordIndexEntry};
use crate::index::words::WordIndex;
use crate::source::IndexSource;
use crate::utils::{HASH_MULTIPLIER, fold_chars, normalize_separators};
use rayon::prelude::*;
use std::time::Instant;

/// Base path naming the index file for `roots`
pub fn snapshot_base_path(roots: &[Root]) -> String {
    roots
        .first()
        .map(|r| normalize_separators(&r.base_path))
        .unwrap_or_default()
}

/// Identity recorded in snapshots built from `roots` with `config`.
///
/// Covers everything that shapes the word index: the ordered roots with their
/// logical prefixes, the prefix length bounds and the root score step. A
/// persisted snapshot is only reused when this matches exactly.
///
/// ```text
/// Assets|Packages=Packages#2..8+100
/// ```
pub fn snapshot_identity(roots: &[Root], config: &IndexConfig) -> String {
    let roots: Vec<String> = roots
        .iter()
        .map(|root| {
            let base = normalize_separators(&root.base_path);
            if root.logical_prefix.is_empty() {
                base
            } else {
                format!("{}={}", base, root.logical_prefix)
            }
        })
        .collect();

    let min = config.min_char_variation.max(1);
    let max = config.max_char_variation.max(min);
    format!("{}#{}..{}+{}", roots.join("|"), min, max, config.root_score_step)
}

/// Word entries for an entry's ordered components.
///
/// Every component contributes its prefixes of `min..=min(len, max)`
/// characters, scored `base_score + ordinal`.
pub fn component_words(
    components: &[String],
    entry_index: EntryIndex,
    base_score: Score,
    config: &IndexConfig,
) -> Vec<WordIndexEntry> {
    let min = config.min_char_variation.max(1);
    let max = config.max_char_variation.max(min);
    let mut words = Vec::new();

    for (ordinal, component) in components.iter().enumerate() {
        let score = base_score.saturating_add(ordinal as Score);

        // Rolling hash: one pass yields every prefix hash
        let mut hash = 0i32;
        let mut length = 0usize;
        for ch in fold_chars(component) {
            hash = hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(ch as i32);
            length += 1;
            if length > max {
                break;
            }
            if length >= min {
                words.push(WordIndexEntry::new(hash, length as u32, entry_index, score));
            }
        }
    }

    words
}

/// Build a fresh snapshot from `roots`.
///
/// Returns `None` when `cancel` fires; nothing partial is produced. Entry
/// indices follow enumeration order, so equal inputs give equal snapshots.
pub fn build_snapshot<S: IndexSource + ?Sized>(
    roots: &[Root],
    source: &S,
    config: &IndexConfig,
    cancel: &CancellationToken,
) -> Option<IndexSnapshot> {
    let started = Instant::now();
    let mut entries = EntryStore::new();
    let mut words: Vec<WordIndexEntry> = Vec::new();

    for (ordinal, root) in roots.iter().enumerate() {
        let base_score = config.base_score(ordinal);
        let raw_entries = source.enumerate(root);
        cancel.is_cancelled()?;

        // Phase 1: assign entry indices sequentially
        let mut root_entries: Vec<(EntryIndex, String)> = Vec::with_capacity(raw_entries.len());
        for raw in raw_entries {
            cancel.is_cancelled()?;

            let Some(entry) = root.map_entry(&normalize_separators(&raw)) else {
                continue;
            };
            if source.should_skip(&entry) || entries.contains(&entry) {
                continue;
            }
            if config.max_entries > 0 && root_entries.len() >= config.max_entries {
                tracing::debug!(
                    "root {} reached max_entries ({}), ignoring the rest",
                    root.base_path,
                    config.max_entries
                );
                break;
            }

            let index = entries.push(entry.clone());
            root_entries.push((index, entry));
        }

        // Phase 2: tokenize in parallel, concatenated in entry order
        let root_words: Vec<Vec<WordIndexEntry>> = root_entries
            .par_iter()
            .map(|(index, entry)| {
                cancel.is_cancelled()?;
                let components = source.split_components(entry, *index);
                Some(component_words(&components, *index, base_score, config))
            })
            .collect::<Option<Vec<_>>>()?;

        // Wordless entries are unreachable and stay unlinked
        let before = words.len();
        let mut wordless = 0;
        for ((_, entry), entry_words) in root_entries.iter().zip(root_words) {
            if entry_words.is_empty() {
                entries.unlink(entry);
                wordless += 1;
            }
            words.extend(entry_words);
        }
        tracing::debug!(
            "indexed root {} ({} entries, {} without words, {} words, base score {})",
            root.base_path,
            root_entries.len(),
            wordless,
            words.len() - before,
            base_score
        );
    }

    cancel.is_cancelled()?;
    let words = WordIndex::from_unsorted(words);

    tracing::info!(
        "built index: {} entries, {} words in {:?}",
        entries.len(),
        words.len(),
        started.elapsed()
    );

    Some(IndexSnapshot::new(snapshot_identity(roots, config), entries, words))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{split_components, token_hash};

    struct ListSource {
        roots: Vec<Vec<&'static str>>,
    }

    impl IndexSource for ListSource {
        fn enumerate(&self, root: &Root) -> Vec<String> {
            let ordinal: usize = root.logical_prefix.parse().unwrap_or(0);
            self.roots[ordinal].iter().map(|s| s.to_string()).collect()
        }

        fn should_skip(&self, entry: &str) -> bool {
            entry.ends_with(".meta")
        }

        fn split_components(&self, entry: &str, _entry_index: EntryIndex) -> Vec<String> {
            split_components(entry)
        }
    }

    fn config() -> IndexConfig {
        IndexConfig::with_variations(2, 8)
    }

    #[test]
    fn test_component_words_prefix_range() {
        let words = component_words(&["hello".to_string()], 3, 10, &config());
        let lengths: Vec<u32> = words.iter().map(|w| w.length).collect();
        assert_eq!(lengths, vec![2, 3, 4, 5]);
        assert_eq!(words[0].key, token_hash("he"));
        assert_eq!(words[3].key, token_hash("hello"));
        assert!(words.iter().all(|w| w.entry_index == 3 && w.score == 10));
    }

    #[test]
    fn test_component_words_clips_and_scores_by_ordinal() {
        let components = vec!["playercontroller".to_string(), "x".to_string(), "ext".to_string()];
        let words = component_words(&components, 0, 100, &config());

        let first: Vec<_> = words.iter().filter(|w| w.score == 100).collect();
        assert_eq!(first.len(), 7); // lengths 2..=8
        assert_eq!(first.last().unwrap().key, token_hash("playerco"));

        // "x" is shorter than the minimum, "ext" keeps its ordinal
        assert!(words.iter().all(|w| w.score != 101));
        assert_eq!(words.iter().filter(|w| w.score == 102).count(), 2);
    }

    #[test]
    fn test_component_words_lowercases() {
        let words = component_words(&["PLAY".to_string()], 0, 0, &config());
        assert_eq!(words.last().unwrap().key, token_hash("play"));
    }

    #[test]
    fn test_build_snapshot_roots_and_skips() {
        let source = ListSource {
            roots: vec![
                vec!["Assets/Player.cs", "Assets/Player.cs.meta", r"Assets\Enemy.cs"],
                vec!["Packages/Player.cs", "Elsewhere/Ignored.cs"],
            ],
        };
        let roots = vec![Root::new("Assets", "0"), Root::new("Packages", "1")];
        let snapshot = build_snapshot(&roots, &source, &config(), &CancellationToken::new()).unwrap();

        let entries: Vec<_> = snapshot.entries.iter().collect();
        assert_eq!(entries, vec!["0/Player.cs", "0/Enemy.cs", "1/Player.cs"]);
        assert_eq!(snapshot.base_path, "Assets=0|Packages=1#2..8+100");
        assert!(snapshot.words.is_sorted());

        // Second root scores start at the root step
        let hits = snapshot.words.lookup(token_hash("pl"), 2, Score::MAX);
        assert_eq!(hits, vec![(0, 0), (2, 100)]);
    }

    #[test]
    fn test_snapshot_identity_covers_roots_and_bounds() {
        let assets = vec![Root::bare(r"C:\Game\Assets")];
        let both = vec![Root::bare("Assets"), Root::new("Packages", "Packages")];

        assert_eq!(snapshot_identity(&assets, &config()), "C:/Game/Assets#2..8+100");
        assert_eq!(snapshot_identity(&both, &config()), "Assets|Packages=Packages#2..8+100");

        let base = snapshot_identity(&both, &config());
        let mut wider = config();
        wider.max_char_variation = 12;
        let mut stepped = config();
        stepped.root_score_step = 10;
        assert_ne!(snapshot_identity(&both, &wider), base);
        assert_ne!(snapshot_identity(&both, &stepped), base);
        assert_ne!(snapshot_identity(&both[..1], &config()), base);
        assert_eq!(snapshot_base_path(&both), snapshot_base_path(&both[..1]));
    }

    #[test]
    fn test_wordless_entries_are_not_live() {
        let source = ListSource {
            roots: vec![vec!["a/b.c", "a/Player.ext"]],
        };
        let roots = vec![Root::new("", "0")];
        let snapshot = build_snapshot(&roots, &source, &config(), &CancellationToken::new()).unwrap();

        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries.live_count(), 1);
        assert!(!snapshot.entries.contains("0/a/b.c"));
        assert_eq!(snapshot.entries.position("0/a/Player.ext"), Some(1));
    }

    #[test]
    fn test_build_snapshot_is_deterministic() {
        let source = ListSource {
            roots: vec![vec!["a/PlayerController.ext", "a/EnemyAI.ext", "a/Level2Boss.ext"]],
        };
        let roots = vec![Root::new("a", "0")];
        let first = build_snapshot(&roots, &source, &config(), &CancellationToken::new()).unwrap();
        let second = build_snapshot(&roots, &source, &config(), &CancellationToken::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_snapshot_cancelled() {
        let source = ListSource {
            roots: vec![vec!["a/x.cs"]],
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(build_snapshot(&[Root::new("a", "0")], &source, &config(), &cancel).is_none());
    }

    #[test]
    fn test_build_snapshot_max_entries() {
        let source = ListSource {
            roots: vec![vec!["a/one.cs", "a/two.cs", "a/three.cs"]],
        };
        let config = IndexConfig {
            max_entries: 2,
            ..config()
        };
        let snapshot =
            build_snapshot(&[Root::new("a", "0")], &source, &config, &CancellationToken::new()).unwrap();
        assert_eq!(snapshot.entries.len(), 2);
    }
}
