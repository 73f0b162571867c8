use std::cmp::Ordering;

use serde::Serialize;

/// A ranked completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub phrase: String,
    pub score: f64,
}

/// Bounded top-K collector of suggestions, kept sorted by descending score.
/// Equal scores are ordered by phrase so output is reproducible.
#[derive(Debug, Clone)]
pub struct SuggestionResultSet {
    name: String,
    capacity: usize,
    items: Vec<Suggestion>,
}

impl SuggestionResultSet {
    pub fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            items: Vec::with_capacity(capacity.min(64)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Suggestion> {
        self.items
    }

    /// Submit a node's phrases. Each phrase scores
    /// `score * normalized / phrase_norm_factor`: the node's share of the
    /// prefix mass times the phrase's share of the node.
    pub fn add_phrases<'a>(
        &mut self,
        phrases: impl IntoIterator<Item = (&'a str, f64)>,
        score: f64,
        phrase_norm_factor: f64,
    ) {
        if !score.is_finite() || score <= 0.0 {
            return;
        }
        if !phrase_norm_factor.is_finite() || phrase_norm_factor <= 0.0 {
            return;
        }

        for (phrase, normalized) in phrases {
            let s = score * normalized / phrase_norm_factor;
            if s.is_finite() {
                self.push(Suggestion {
                    phrase: phrase.to_string(),
                    score: s,
                });
            }
        }
    }

    /// Fold another collector's entries into this one.
    pub fn merge(&mut self, other: SuggestionResultSet) {
        for s in other.items {
            self.push(s);
        }
    }

    fn push(&mut self, s: Suggestion) {
        if self.capacity == 0 {
            return;
        }

        // Same phrase from two sources keeps the better score.
        if let Some(i) = self.items.iter().position(|e| e.phrase == s.phrase) {
            if s.score <= self.items[i].score {
                return;
            }
            self.items.remove(i);
        }

        if self.items.len() == self.capacity {
            if let Some(last) = self.items.last() {
                if rank(&s, last) != Ordering::Less {
                    return;
                }
            }
            self.items.pop();
        }

        let at = self
            .items
            .binary_search_by(|e| rank(e, &s))
            .unwrap_or_else(|i| i);
        self.items.insert(at, s);
    }
}

/// Higher score first, then lexical phrase order.
fn rank(a: &Suggestion, b: &Suggestion) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.phrase.cmp(&b.phrase))
}
