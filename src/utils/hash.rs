/// Multiplier of the polynomial string hash
pub const HASH_MULTIPLIER: i32 = 31;

/// Case-folded characters of `text`.
///
/// Folding is per code point, so it ignores context (a final `Σ` folds to `σ`
/// like any other). Index and query text both go through here.
#[inline]
pub fn fold_chars(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().flat_map(char::to_lowercase)
}

/// [`fold_chars`] collected into a string
pub fn fold_case(text: &str) -> String {
    fold_chars(text).collect()
}

/// Hash a token into the 32-bit key stored in the word index.
///
/// Polynomial hash over lowercased code points with wrapping arithmetic. The
/// value is stable across runs and platforms, so persisted snapshots remain
/// valid. Only the hash is stored: equal-length tokens that collide are
/// indistinguishable at lookup time.
#[inline]
pub fn token_hash(token: &str) -> i32 {
    fold_chars(token).fold(0i32, |h, ch| {
            h.wrapping_mul(HASH_MULTIPLIER).wrapping_add(ch as i32)
        })
}

/// Hash the first `len` characters of `token`
#[inline]
pub fn prefix_hash(token: &str, len: usize) -> i32 {
    token
        .chars()
        .take(len)
        .fold(0i32, |h, ch| {
            h.wrapping_mul(HASH_MULTIPLIER).wrapping_add(ch as i32)
        })
}
