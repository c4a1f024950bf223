use crate::index::types::IndexConfig;
use crate::utils::{fold_case, prefix_hash};

/// One lookup key derived from query text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    /// Lowercased, clipped token text
    pub text: String,
    /// Length in characters
    pub length: u32,
    pub hash: i32,
}

/// Tokenize query text into lookup keys.
///
/// The text is lowercased and split on the configured separators. Tokens
/// shorter than the minimum prefix length are dropped, longer ones clipped to
/// the maximum, and the result is ordered longest first.
pub fn query_tokens(text: &str, config: &IndexConfig) -> Vec<QueryToken> {
    let min = config.min_char_variation.max(1);
    let max = config.max_char_variation.max(min);
    let lowered = fold_case(text);

    let mut tokens: Vec<QueryToken> = lowered
        .split(|c: char| config.separators.contains(c) || c.is_whitespace())
        .filter_map(|raw| {
            let count = raw.chars().count();
            if count < min {
                return None;
            }
            let length = count.min(max);
            let clipped: String = raw.chars().take(length).collect();
            Some(QueryToken {
                hash: prefix_hash(&clipped, length),
                text: clipped,
                length: length as u32,
            })
        })
        .collect();

    tokens.sort_by(|a, b| b.length.cmp(&a.length));
    let mut seen = Vec::with_capacity(tokens.len());
    tokens.retain(|t| {
        if seen.contains(&t.text) {
            false
        } else {
            seen.push(t.text.clone());
            true
        }
    });
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::token_hash;

    fn texts(tokens: &[QueryToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_split_drop_and_order() {
        let config = IndexConfig::with_variations(2, 8);
        let tokens = query_tokens("Player_Ctrl x.ext", &config);
        assert_eq!(texts(&tokens), vec!["player", "ctrl", "ext"]);
    }

    #[test]
    fn test_clip_to_max() {
        let config = IndexConfig::with_variations(2, 8);
        let tokens = query_tokens("PlayerController", &config);
        assert_eq!(texts(&tokens), vec!["playerco"]);
        assert_eq!(tokens[0].length, 8);
        assert_eq!(tokens[0].hash, token_hash("playerco"));
    }

    #[test]
    fn test_too_short_and_empty() {
        let config = IndexConfig::with_variations(3, 8);
        assert!(query_tokens("ab c", &config).is_empty());
        assert!(query_tokens("", &config).is_empty());
        assert!(query_tokens(" /// ", &config).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let config = IndexConfig::with_variations(2, 4);
        let tokens = query_tokens("play playing", &config);
        assert_eq!(texts(&tokens), vec!["play"]);
    }

    #[test]
    fn test_multibyte_lengths() {
        let config = IndexConfig::with_variations(2, 3);
        let tokens = query_tokens("Ünïcode", &config);
        assert_eq!(texts(&tokens), vec!["üni"]);
        assert_eq!(tokens[0].length, 3);
        assert_eq!(tokens[0].hash, token_hash("üni"));
    }
}
