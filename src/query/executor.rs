use crate::index::types::{EntryIndex, IndexConfig, IndexSnapshot, MAX_SCORE, Score, SearchHit};
use crate::query::parser::{QueryNode, parse_query};
use crate::query::terms::{QueryToken, query_tokens};
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

/// Options applied to one search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchOptions {
    /// Only words scoring strictly below this match
    pub max_score: Score,
    /// Maximum results, 0 = unlimited
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_score: MAX_SCORE,
            limit: 0,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Entries with their best score, in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredSet {
    hits: Vec<(EntryIndex, Score)>,
    positions: FxHashMap<EntryIndex, usize>,
}

impl ScoredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, keeping the lower score if it is already present
    pub fn add(&mut self, entry: EntryIndex, score: Score) {
        if let Some(&pos) = self.positions.get(&entry) {
            let existing = &mut self.hits[pos].1;
            *existing = (*existing).min(score);
        } else {
            self.positions.insert(entry, self.hits.len());
            self.hits.push((entry, score));
        }
    }

    pub fn score(&self, entry: EntryIndex) -> Option<Score> {
        self.positions.get(&entry).map(|&pos| self.hits[pos].1)
    }

    /// Entries present in both, scored by the minimum; keeps this set's order
    pub fn intersect(&self, other: &ScoredSet) -> ScoredSet {
        let mut result = ScoredSet::new();
        for &(entry, score) in &self.hits {
            if let Some(other_score) = other.score(entry) {
                result.add(entry, score.min(other_score));
            }
        }
        result
    }

    /// Entries of either, scored by the minimum; this set's entries first
    pub fn union(mut self, other: ScoredSet) -> ScoredSet {
        for (entry, score) in other.hits {
            self.add(entry, score);
        }
        self
    }

    /// Drop every entry in `excluded`
    pub fn subtract(self, excluded: &RoaringBitmap) -> ScoredSet {
        let mut result = ScoredSet::new();
        for (entry, score) in self.hits {
            if !excluded.contains(entry) {
                result.add(entry, score);
            }
        }
        result
    }

    pub fn to_bitmap(&self) -> RoaringBitmap {
        self.hits.iter().map(|&(entry, _)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hits ascending by score, ties in discovery order
    pub fn into_ranked(self) -> Vec<(EntryIndex, Score)> {
        let mut hits = self.hits;
        hits.sort_by_key(|&(_, score)| score);
        hits
    }
}

impl FromIterator<(EntryIndex, Score)> for ScoredSet {
    fn from_iter<I: IntoIterator<Item = (EntryIndex, Score)>>(iter: I) -> Self {
        let mut set = ScoredSet::new();
        for (entry, score) in iter {
            set.add(entry, score);
        }
        set
    }
}

/// Result of evaluating one node
enum Eval {
    /// No usable token; ignored by And/Or
    Neutral,
    Set(ScoredSet),
}

/// Evaluates queries against one immutable snapshot
pub struct QueryEvaluator<'a> {
    snapshot: &'a IndexSnapshot,
    config: &'a IndexConfig,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(snapshot: &'a IndexSnapshot, config: &'a IndexConfig) -> Self {
        Self { snapshot, config }
    }

    /// Parse and evaluate `query`, returning ranked hits
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        let node = parse_query(query);
        self.evaluate(&node, options)
            .into_iter()
            .filter_map(|(entry_index, score)| {
                let entry = self.snapshot.entries.get(entry_index)?;
                Some(SearchHit {
                    entry: entry.to_string(),
                    entry_index,
                    score,
                })
            })
            .collect()
    }

    /// Evaluate a parsed query into `(entry, score)` pairs ascending by score.
    ///
    /// A query with no positive term yields nothing.
    pub fn evaluate(&self, node: &QueryNode, options: &SearchOptions) -> Vec<(EntryIndex, Score)> {
        let mut hits = match self.eval(node, options.max_score) {
            Eval::Neutral => return Vec::new(),
            Eval::Set(set) => set.into_ranked(),
        };
        if options.limit > 0 {
            hits.truncate(options.limit);
        }
        hits
    }

    /// Single-call AND over the tokens of `text`
    pub fn lookup_text(&self, text: &str, max_score: Score) -> Option<ScoredSet> {
        let tokens = query_tokens(text, self.config);
        if tokens.is_empty() {
            return None;
        }
        Some(self.lookup_tokens(&tokens, max_score))
    }

    fn lookup_tokens(&self, tokens: &[QueryToken], max_score: Score) -> ScoredSet {
        let mut result: Option<ScoredSet> = None;

        // Longest (most selective) token first
        for token in tokens {
            let matches: ScoredSet = self
                .snapshot
                .words
                .lookup(token.hash, token.length, max_score)
                .into_iter()
                .collect();

            let next = match result {
                Some(current) => current.intersect(&matches),
                None => matches,
            };
            if next.is_empty() {
                return next;
            }
            result = Some(next);
        }

        result.unwrap_or_default()
    }

    fn eval(&self, node: &QueryNode, max_score: Score) -> Eval {
        match node {
            QueryNode::Empty => Eval::Neutral,
            QueryNode::Term(text) => match self.lookup_text(text, max_score) {
                Some(set) => Eval::Set(set),
                None => Eval::Neutral,
            },
            // A negation only excludes within an And
            QueryNode::Not(_) => Eval::Neutral,
            QueryNode::Or(nodes) => {
                let mut result: Option<ScoredSet> = None;
                for child in nodes {
                    if let Eval::Set(set) = self.eval(child, max_score) {
                        result = Some(match result {
                            Some(current) => current.union(set),
                            None => set,
                        });
                    }
                }
                result.map_or(Eval::Neutral, Eval::Set)
            }
            QueryNode::And(nodes) => self.eval_and(nodes, max_score),
        }
    }

    fn eval_and(&self, nodes: &[QueryNode], max_score: Score) -> Eval {
        let mut result: Option<ScoredSet> = None;

        for child in nodes.iter().filter(|n| !matches!(n, QueryNode::Not(_))) {
            if let Eval::Set(set) = self.eval(child, max_score) {
                let next = match result {
                    Some(current) => current.intersect(&set),
                    None => set,
                };
                let done = next.is_empty();
                result = Some(next);
                if done {
                    break;
                }
            }
        }

        let Some(mut result) = result else {
            return Eval::Neutral;
        };

        for child in nodes {
            if result.is_empty() {
                break;
            }
            if let QueryNode::Not(inner) = child {
                // Excluded regardless of score
                if let Eval::Set(excluded) = self.eval(inner, MAX_SCORE) {
                    result = result.subtract(&excluded.to_bitmap());
                }
            }
        }

        Eval::Set(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CancellationToken;
    use crate::index::build::build_snapshot;
    use crate::index::types::Root;
    use crate::source::IndexSource;
    use crate::utils::split_components;

    struct ListSource(Vec<&'static str>);

    impl IndexSource for ListSource {
        fn enumerate(&self, _root: &Root) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }

        fn split_components(&self, entry: &str, _entry_index: EntryIndex) -> Vec<String> {
            split_components(entry)
        }
    }

    fn snapshot(entries: Vec<&'static str>) -> (IndexSnapshot, IndexConfig) {
        let config = IndexConfig::with_variations(2, 8);
        let snapshot = build_snapshot(
            &[Root::bare("")],
            &ListSource(entries),
            &config,
            &CancellationToken::new(),
        )
        .unwrap();
        (snapshot, config)
    }

    fn entries(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.entry.as_str()).collect()
    }

    fn search(snapshot: &IndexSnapshot, config: &IndexConfig, query: &str) -> Vec<SearchHit> {
        QueryEvaluator::new(snapshot, config).search(query, &SearchOptions::default())
    }

    #[test]
    fn test_scenario_player_controller() {
        let (snapshot, config) =
            snapshot(vec!["Scripts/PlayerController.ext", "Scripts/EnemyAI.ext"]);

        let hits = search(&snapshot, &config, "play");
        assert_eq!(entries(&hits), vec!["Scripts/PlayerController.ext"]);
        assert!(search(&snapshot, &config, "xyz").is_empty());
    }

    /// Hands entries back verbatim as their only component
    struct VerbatimSource(Vec<&'static str>);

    impl IndexSource for VerbatimSource {
        fn enumerate(&self, _root: &Root) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }

        fn split_components(&self, entry: &str, _entry_index: EntryIndex) -> Vec<String> {
            vec![entry.to_string()]
        }
    }

    #[test]
    fn test_non_ascii_components_fold_like_queries() {
        let config = IndexConfig::with_variations(2, 8);
        let snapshot = build_snapshot(
            &[Root::bare("")],
            &VerbatimSource(vec!["ΟΔΟΣ", "Straße"]),
            &config,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(entries(&search(&snapshot, &config, "ΟΔΟΣ")), vec!["ΟΔΟΣ"]);
        assert_eq!(entries(&search(&snapshot, &config, "οδοσ")), vec!["ΟΔΟΣ"]);
        assert_eq!(entries(&search(&snapshot, &config, "STRASSE")), Vec::<&str>::new());
        assert_eq!(entries(&search(&snapshot, &config, "straße")), vec!["Straße"]);
    }

    #[test]
    fn test_every_prefix_matches() {
        let (snapshot, config) = snapshot(vec!["docs/hello.txt", "docs/world.txt"]);
        for prefix in ["he", "hel", "hell", "hello"] {
            let hits = search(&snapshot, &config, prefix);
            assert_eq!(entries(&hits), vec!["docs/hello.txt"], "prefix {}", prefix);
        }
        assert!(search(&snapshot, &config, "h").is_empty());
    }

    #[test]
    fn test_and_is_intersection_with_min_score() {
        let (snapshot, config) = snapshot(vec![
            "Scripts/PlayerController.ext",
            "Scripts/PlayerInput.ext",
            "UI/ControllerMenu.ext",
        ]);
        let both = search(&snapshot, &config, "player controller");
        let player = search(&snapshot, &config, "player");
        let controller = search(&snapshot, &config, "controller");

        let mut expected: Vec<(EntryIndex, Score)> = player
            .iter()
            .filter_map(|p| {
                let c = controller.iter().find(|c| c.entry_index == p.entry_index)?;
                Some((p.entry_index, p.score.min(c.score)))
            })
            .collect();
        expected.sort_by_key(|&(_, s)| s);

        let actual: Vec<_> = both.iter().map(|h| (h.entry_index, h.score)).collect();
        assert_eq!(actual, expected);
        assert_eq!(entries(&both), vec!["Scripts/PlayerController.ext"]);
    }

    #[test]
    fn test_ranked_by_component_ordinal() {
        let (snapshot, config) = snapshot(vec!["player/level.ext", "level/player.ext"]);
        let hits = search(&snapshot, &config, "player");
        // The stem scores better than a directory component
        assert_eq!(entries(&hits), vec!["level/player.ext", "player/level.ext"]);
        assert!(hits[0].score < hits[1].score);
    }

    #[test]
    fn test_or_and_not() {
        let (snapshot, config) = snapshot(vec![
            "Scripts/Player.ext",
            "Scripts/Enemy.ext",
            "Art/Player.png",
        ]);

        let hits = search(&snapshot, &config, "player | enemy");
        assert_eq!(hits.len(), 3);

        let hits = search(&snapshot, &config, "player -png");
        assert_eq!(entries(&hits), vec!["Scripts/Player.ext"]);

        let hits = search(&snapshot, &config, "scripts !(enemy | xyz)");
        assert_eq!(entries(&hits), vec!["Scripts/Player.ext"]);
    }

    #[test]
    fn test_only_negation_is_empty() {
        let (snapshot, config) = snapshot(vec!["Scripts/Player.ext"]);
        assert!(search(&snapshot, &config, "-enemy").is_empty());
    }

    #[test]
    fn test_short_terms_are_neutral() {
        let (snapshot, config) = snapshot(vec!["Scripts/Player.ext", "Scripts/Enemy.ext"]);
        assert!(search(&snapshot, &config, "").is_empty());
        assert!(search(&snapshot, &config, "a").is_empty());

        let hits = search(&snapshot, &config, "player a");
        assert_eq!(entries(&hits), vec!["Scripts/Player.ext"]);
    }

    #[test]
    fn test_max_score_and_limit() {
        let (snapshot, config) = snapshot(vec!["level/player.ext", "player/level.ext"]);
        let evaluator = QueryEvaluator::new(&snapshot, &config);

        let options = SearchOptions {
            max_score: 1,
            limit: 0,
        };
        let hits = evaluator.search("player", &options);
        assert_eq!(entries(&hits), vec!["level/player.ext"]);

        let hits = evaluator.search("player", &SearchOptions::with_limit(1));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_hash_collision_cross_matches() {
        // "an" and "c0" share a hash; only the hash is stored
        let (snapshot, config) = snapshot(vec!["docs/an.txt"]);
        let hits = search(&snapshot, &config, "c0");
        assert_eq!(entries(&hits), vec!["docs/an.txt"]);
    }

    #[test]
    fn test_scored_set_ops() {
        let a: ScoredSet = [(1, 5), (2, 1), (3, 4)].into_iter().collect();
        let b: ScoredSet = [(3, 2), (1, 7), (9, 0)].into_iter().collect();

        assert_eq!(a.intersect(&b).into_ranked(), vec![(3, 2), (1, 5)]);
        assert_eq!(
            a.clone().union(b.clone()).into_ranked(),
            vec![(9, 0), (2, 1), (3, 2), (1, 5)]
        );
        assert_eq!(a.subtract(&b.to_bitmap()).into_ranked(), vec![(2, 1)]);
    }
}
