use crate::utils::hash::fold_case;
use rustc_hash::FxHashSet;

/// Maximum component length kept by the default splitter.
/// Longer components are usually hashes or generated names.
const MAX_COMPONENT_LENGTH: usize = 128;

/// Normalize path separators to forward slashes
pub fn normalize_separators(entry: &str) -> String {
    if entry.contains('\\') {
        entry.replace('\\', "/")
    } else {
        entry.to_string()
    }
}

/// Split an entry path into ordered search components.
///
/// Order decides scoring, earlier components rank better:
/// 1. file stem (`playercontroller`)
/// 2. stem words split on camelCase, snake_case and digits (`player`, `controller`)
/// 3. extension (`ext`)
/// 4. directories, innermost first
///
/// Components are lowercased and deduplicated, keeping the first occurrence.
pub fn split_components(entry: &str) -> Vec<String> {
    let normalized = normalize_separators(entry);
    let mut parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();

    let Some(file_name) = parts.pop() else {
        return Vec::new();
    };

    let (stem, ext) = match file_name.rfind('.') {
        Some(0) | None => (file_name, None),
        Some(i) => (&file_name[..i], Some(&file_name[i + 1..])),
    };

    let mut seen = FxHashSet::default();
    let mut components = Vec::new();

    push_component(&mut components, &mut seen, stem);
    for word in split_words(stem) {
        push_component(&mut components, &mut seen, &word);
    }
    if let Some(ext) = ext {
        push_component(&mut components, &mut seen, ext);
    }
    for dir in parts.iter().rev() {
        push_component(&mut components, &mut seen, dir);
        for word in split_words(dir) {
            push_component(&mut components, &mut seen, &word);
        }
    }

    components
}

fn push_component(components: &mut Vec<String>, seen: &mut FxHashSet<String>, raw: &str) {
    let lower = fold_case(raw);
    if lower.is_empty() || lower.chars().count() > MAX_COMPONENT_LENGTH {
        return;
    }
    if seen.insert(lower.clone()) {
        components.push(lower);
    }
}

/// Split an identifier-like name into words
///
/// Handles camelCase, PascalCase, snake_case, kebab-case, dotted names and
/// letter/digit boundaries. Acronym runs stay together (`EnemyAI` -> `enemy`, `ai`).
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev = CharType::Other;

    for ch in name.chars() {
        let char_type = classify_char(ch);

        match char_type {
            CharType::Lower => {
                // "HTTPServer": the 'S' before "erver" starts a new word
                if prev == CharType::Upper && current.chars().count() > 1 {
                    let last = current.pop();
                    flush_word(&mut words, &mut current);
                    if let Some(last) = last {
                        current.push(last);
                    }
                } else if prev == CharType::Digit {
                    flush_word(&mut words, &mut current);
                }
                current.extend(ch.to_lowercase());
            }
            CharType::Upper => {
                if prev == CharType::Lower || prev == CharType::Digit {
                    flush_word(&mut words, &mut current);
                }
                current.extend(ch.to_lowercase());
            }
            CharType::Digit => {
                if prev == CharType::Lower || prev == CharType::Upper {
                    flush_word(&mut words, &mut current);
                }
                current.push(ch);
            }
            CharType::Other => flush_word(&mut words, &mut current),
        }

        prev = char_type;
    }
    flush_word(&mut words, &mut current);

    words
}

fn flush_word(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CharType {
    Upper,
    Lower,
    Digit,
    Other,
}

fn classify_char(ch: char) -> CharType {
    if ch.is_uppercase() {
        CharType::Upper
    } else if ch.is_lowercase() {
        CharType::Lower
    } else if ch.is_ascii_digit() {
        CharType::Digit
    } else if ch.is_alphabetic() {
        // Scripts without case behave like lowercase letters
        CharType::Lower
    } else {
        CharType::Other
    }
}
