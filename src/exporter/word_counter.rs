use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

/// Counts maximal runs of word characters (letters, digits, underscore).
///
/// Punctuation, whitespace and braces never count, so `fn main() {}` is two
/// words and `a_b-c` is two.
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}
