use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_WORD: Regex = Regex::new(r"[\p{L}\p{N}']+").unwrap();
}

/// Tokenizer trait for converting document text to indexable terms.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Lowercased runs of letters, digits and apostrophes. Everything else
/// separates tokens.
pub struct SimpleTokenizer;

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        RE_WORD
            .find_iter(text)
            .map(|m| m.as_str().trim_matches('\'').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Normalize a typed query: lowercase, replace dashes with spaces.
pub fn normalize_word(s: &str) -> String {
    s.to_lowercase().replace('-', " ")
}

/// The partially typed token a query completes: its last word, split the same
/// way documents are so indexed terms stay reachable.
pub fn partial_token(query: &str) -> Option<String> {
    let q = normalize_word(query);
    if q.ends_with(char::is_whitespace) {
        return None;
    }
    SimpleTokenizer.tokenize(&q).pop()
}
