mod normalize;
mod phrase;

pub use normalize::NormalizeCount;
pub use phrase::{Phrase, PhraseCount};

use std::collections::{btree_map::Entry, BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::results::SuggestionResultSet;

/// Largest n-gram order the phrase counters can carry.
pub const MAX_NGRAM: usize = 9;

#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    #[error("cannot insert an empty term")]
    EmptyTerm,
    #[error("n-gram order must be between 1 and {max}, got {0}", max = MAX_NGRAM)]
    InvalidNgram(usize),
    #[error("malformed phrase counter: n-gram order {ngram} outside 1..={max}")]
    MalformedCounter { ngram: usize, max: usize },
    #[error("node '{0}' has no term normalization; run it first")]
    NotNormalized(String),
    #[error("expected {expected} per-order averages, got {got}")]
    AverageLength { expected: usize, got: usize },
    #[error("invalid log average frequency {value} for n-gram order {order}")]
    InvalidAverage { order: usize, value: f64 },
}

/// One prefix string of the corpus vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrieNode {
    prefix: String,
    children: BTreeMap<char, TrieNode>,

    /// Occurrences of the term ending at this node.
    pub term_freq: u64,

    /// Documents containing the term ending at this node.
    pub doc_freq: u64,

    /// Phrases beginning with the term ending at this node.
    phrases: BTreeMap<String, Phrase>,

    /// Subtree aggregate, populated by term normalization.
    norm: Option<NormalizeCount>,

    /// Corpus size seen by term normalization (only when doc_freq > 0).
    numdocs: u64,
}

impl TrieNode {
    fn new(prefix: String) -> Self {
        Self {
            prefix,
            ..Default::default()
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn child(&self, c: char) -> Option<&TrieNode> {
        self.children.get(&c)
    }

    pub fn children(&self) -> impl Iterator<Item = (&char, &TrieNode)> {
        self.children.iter()
    }

    pub fn phrases(&self) -> impl Iterator<Item = (&String, &Phrase)> {
        self.phrases.iter()
    }

    pub fn phrase(&self, phrase: &str) -> Option<&Phrase> {
        self.phrases.get(phrase)
    }

    pub fn normalize_count(&self) -> Option<&NormalizeCount> {
        self.norm.as_ref()
    }

    pub fn numdocs(&self) -> u64 {
        self.numdocs
    }

    /// Count one more occurrence of `phrase` on this node. A phrase seen for
    /// the first time starts from `default`. Returns the updated counter.
    pub fn record_phrase(&mut self, phrase: &str, default: PhraseCount) -> PhraseCount {
        let entry = self
            .phrases
            .entry(phrase.to_string())
            .or_insert_with(|| Phrase::new(default));

        entry.counter = entry.counter.incremented();
        entry.counter
    }

    fn count_nodes(&self) -> usize {
        1 + self.children.values().map(|c| c.count_nodes()).sum::<usize>()
    }

    fn prune(&mut self, min_doc_freq: u64, min_term_freq: u64, protected: &HashSet<String>) {
        if !protected.contains(&self.prefix)
            && (self.term_freq < min_term_freq || self.doc_freq < min_doc_freq)
        {
            self.term_freq = 0;
            self.doc_freq = 0;
            self.phrases.clear();
        }

        // Children are evaluated on their own regardless of the parent.
        for child in self.children.values_mut() {
            child.prune(min_doc_freq, min_term_freq, protected);
        }
    }

    /// Score this subtree against the fixed denominator of the queried prefix.
    fn rank(&self, term_norm_factor: f64, max_results: usize) -> SuggestionResultSet {
        let mut out = SuggestionResultSet::new(&self.prefix, max_results);

        if !self.phrases.is_empty() && self.doc_freq > 0 && self.numdocs > 0 {
            let score = normalize::idf_mass(self.term_freq, self.doc_freq, self.numdocs)
                / term_norm_factor;
            let phrase_norm_factor = self
                .norm
                .as_ref()
                .map(|nc| nc.phrase_norm_factor)
                .unwrap_or(0.0);

            out.add_phrases(
                self.phrases
                    .iter()
                    .filter_map(|(k, p)| p.normalized.map(|v| (k.as_str(), v))),
                score,
                phrase_norm_factor,
            );
        }

        for child in self.children.values() {
            out.merge(child.rank(term_norm_factor, max_results));
        }

        out
    }
}

/// Character-level prefix tree of corpus terms and the phrases they start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trie {
    root: TrieNode,

    /// Max n-gram order, shared by every node's aggregate.
    ngram: usize,
}

impl Trie {
    pub fn new(ngram: usize) -> Result<Self, TrieError> {
        if ngram == 0 || ngram > MAX_NGRAM {
            return Err(TrieError::InvalidNgram(ngram));
        }

        Ok(Self {
            root: TrieNode::new(String::new()),
            ngram,
        })
    }

    pub fn ngram(&self) -> usize {
        self.ngram
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Total nodes including the root.
    pub fn len(&self) -> usize {
        self.root.count_nodes()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Walk (creating nodes on demand) to the node for `term` and return it.
    pub fn insert(&mut self, term: &str) -> Result<&mut TrieNode, TrieError> {
        if term.is_empty() {
            return Err(TrieError::EmptyTerm);
        }

        let mut node = &mut self.root;
        for c in term.chars() {
            node = match node.children.entry(c) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let mut prefix = String::with_capacity(node.prefix.len() + c.len_utf8());
                    prefix.push_str(&node.prefix);
                    prefix.push(c);
                    e.insert(TrieNode::new(prefix))
                }
            };
        }

        Ok(node)
    }

    /// Node for an exact prefix, if one was ever inserted.
    pub fn get(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for c in prefix.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }

    /// Aggregate every node's subtree term mass and n-gram tallies. Returns the
    /// root aggregate.
    pub fn compute_term_normalization(
        &mut self,
        numdocs: u64,
    ) -> Result<NormalizeCount, TrieError> {
        self.root.compute_term_normalization(numdocs, self.ngram)
    }

    /// Replace raw phrase counts with per-order normalized scores.
    /// `logavgfreq[k]` is the average for n-gram order k + 1.
    pub fn normalize_phrases(&mut self, logavgfreq: &[f64]) -> Result<(), TrieError> {
        if logavgfreq.len() != self.ngram {
            return Err(TrieError::AverageLength {
                expected: self.ngram,
                got: logavgfreq.len(),
            });
        }

        self.root.normalize_phrases(logavgfreq, self.ngram)
    }

    /// Zero the statistics of every unprotected node under either threshold.
    /// Nodes are never removed.
    pub fn prune(&mut self, min_doc_freq: u64, min_term_freq: u64, protected: &HashSet<String>) {
        self.root.prune(min_doc_freq, min_term_freq, protected);
    }

    /// Top `max_results` phrases completing `prefix`, best first.
    pub fn suggest(&self, prefix: &str, max_results: usize) -> SuggestionResultSet {
        let Some(node) = self.get(prefix) else {
            return SuggestionResultSet::new(prefix, max_results);
        };

        let term_norm_factor = match node.norm.as_ref() {
            Some(nc) if nc.term_norm_factor.is_finite() && nc.term_norm_factor > 0.0 => {
                nc.term_norm_factor
            }
            _ => {
                log::debug!("no normalization mass under prefix '{}'", prefix);
                return SuggestionResultSet::new(prefix, max_results);
            }
        };

        node.rank(term_norm_factor, max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(node: &TrieNode) -> Vec<String> {
        let mut out = vec![node.prefix().to_string()];
        for (_, c) in node.children() {
            out.extend(shape(c));
        }
        out
    }

    /// Add a term with its unigram phrase, as ingest does.
    fn add_term(trie: &mut Trie, term: &str, tf: u64, df: u64) {
        let node = trie.insert(term).unwrap();
        node.term_freq = tf;
        node.doc_freq = df;
        for _ in 0..tf {
            node.record_phrase(term, PhraseCount::new(0, 1));
        }
    }

    fn finalize(trie: &mut Trie, numdocs: u64) {
        let root = trie.compute_term_normalization(numdocs).unwrap();
        trie.normalize_phrases(&root.log_average_frequencies()).unwrap();
    }

    #[test]
    fn insert_creates_prefix_nodes() {
        let mut trie = Trie::new(2).unwrap();
        assert!(trie.is_empty());
        assert_eq!(trie.insert("cat").unwrap().prefix(), "cat");

        assert_eq!(trie.root().prefix(), "");
        assert_eq!(trie.get("c").unwrap().prefix(), "c");
        assert_eq!(trie.get("ca").unwrap().prefix(), "ca");
        assert!(trie.get("cab").is_none());
        assert_eq!(trie.len(), 4);
    }

    #[test]
    fn insert_reuses_path() {
        let mut trie = Trie::new(2).unwrap();
        trie.insert("cat").unwrap().term_freq += 1;
        trie.insert("cat").unwrap().term_freq += 1;
        trie.insert("car").unwrap();

        assert_eq!(trie.len(), 5);
        assert_eq!(trie.get("cat").unwrap().term_freq, 2);
        assert_eq!(trie.get("ca").unwrap().children().count(), 2);
    }

    #[test]
    fn insert_multibyte() {
        let mut trie = Trie::new(1).unwrap();
        trie.insert("नमस्ते").unwrap();
        trie.insert("café").unwrap();
        assert_eq!(trie.get("caf").unwrap().child('é').unwrap().prefix(), "café");
        assert!(trie.get("नम").is_some());
    }

    #[test]
    fn insert_empty_term() {
        let mut trie = Trie::new(2).unwrap();
        assert!(matches!(trie.insert(""), Err(TrieError::EmptyTerm)));
    }

    #[test]
    fn invalid_ngram() {
        assert!(matches!(Trie::new(0), Err(TrieError::InvalidNgram(0))));
        assert!(matches!(Trie::new(10), Err(TrieError::InvalidNgram(10))));
        assert!(Trie::new(MAX_NGRAM).is_ok());
    }

    #[test]
    fn record_phrase_counts() {
        let mut trie = Trie::new(3).unwrap();
        let node = trie.insert("big").unwrap();
        assert_eq!(
            node.record_phrase("big apple", PhraseCount::new(0, 2)),
            PhraseCount::new(1, 2)
        );
        assert_eq!(
            node.record_phrase("big apple", PhraseCount::new(0, 2)),
            PhraseCount::new(2, 2)
        );
        // The default only applies on first sight.
        assert_eq!(
            node.record_phrase("big apple", PhraseCount::new(40, 3)),
            PhraseCount::new(3, 2)
        );
        assert!((node.phrase("big apple").unwrap().counter.pack() - 3.2).abs() < 1e-12);
    }

    #[test]
    fn prune_keeps_shape() {
        let mut trie = Trie::new(1).unwrap();
        add_term(&mut trie, "a", 1, 1);
        add_term(&mut trie, "ab", 9, 4);
        add_term(&mut trie, "abc", 2, 1);
        add_term(&mut trie, "b", 5, 5);

        let before = shape(trie.root());
        trie.prune(2, 3, &HashSet::new());
        assert_eq!(before, shape(trie.root()));

        let a = trie.get("a").unwrap();
        assert_eq!((a.term_freq, a.doc_freq, a.phrases().count()), (0, 0, 0));

        // A pruned parent does not stop its children being kept.
        let ab = trie.get("ab").unwrap();
        assert_eq!((ab.term_freq, ab.doc_freq, ab.phrases().count()), (9, 4, 1));

        let abc = trie.get("abc").unwrap();
        assert_eq!((abc.term_freq, abc.doc_freq, abc.phrases().count()), (0, 0, 0));

        assert_eq!(trie.get("b").unwrap().term_freq, 5);
    }

    #[test]
    fn prune_protected() {
        let mut trie = Trie::new(1).unwrap();
        add_term(&mut trie, "rare", 1, 1);
        add_term(&mut trie, "rarer", 1, 1);

        let protected: HashSet<String> = ["rare".to_string()].into_iter().collect();
        trie.prune(10, 10, &protected);

        let rare = trie.get("rare").unwrap();
        assert_eq!((rare.term_freq, rare.doc_freq), (1, 1));
        assert!(rare.phrase("rare").is_some());
        assert_eq!(trie.get("rarer").unwrap().term_freq, 0);
    }

    #[test]
    fn suggest_cat_car() {
        let mut trie = Trie::new(2).unwrap();
        add_term(&mut trie, "cat", 20, 5);
        add_term(&mut trie, "car", 9, 3);

        let root = trie.compute_term_normalization(100).unwrap();
        let want = 20.0 * (100.0f64 / 5.0).log10() + 9.0 * (100.0f64 / 3.0).log10();
        assert!((root.term_norm_factor - want).abs() < 1e-9);
        assert!((root.term_norm_factor - 39.73).abs() < 0.01);
        trie.normalize_phrases(&root.log_average_frequencies()).unwrap();

        let res = trie.suggest("ca", 5).into_vec();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].phrase, "cat");
        assert_eq!(res[1].phrase, "car");
        assert!(res[0].score > res[1].score);

        // Each term owns its only phrase, so scores sum to one under "ca".
        assert!((res[0].score + res[1].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn suggest_unknown_prefix() {
        let mut trie = Trie::new(1).unwrap();
        add_term(&mut trie, "dog", 2, 1);
        finalize(&mut trie, 10);

        assert!(trie.suggest("cat", 5).is_empty());
        assert!(trie.suggest("dx", 5).is_empty());
    }

    #[test]
    fn suggest_before_normalization() {
        let mut trie = Trie::new(1).unwrap();
        add_term(&mut trie, "dog", 2, 1);
        assert!(trie.suggest("d", 5).is_empty());
    }

    #[test]
    fn suggest_zero_mass() {
        let mut trie = Trie::new(1).unwrap();
        // Term in every document carries no IDF mass.
        add_term(&mut trie, "the", 50, 10);
        finalize(&mut trie, 10);
        assert!(trie.suggest("th", 5).is_empty());
    }

    #[test]
    fn suggest_skips_zero_doc_freq() {
        let mut trie = Trie::new(1).unwrap();
        add_term(&mut trie, "ant", 3, 1);
        let node = trie.insert("anvil").unwrap();
        node.record_phrase("anvil", PhraseCount::new(0, 1));
        finalize(&mut trie, 10);

        let res = trie.suggest("an", 5).into_vec();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].phrase, "ant");
    }

    #[test]
    fn suggest_bounded_and_stable() {
        let mut trie = Trie::new(2).unwrap();
        for (i, t) in ["pa", "pb", "pc", "pd", "pe", "pf", "pg"].iter().enumerate() {
            add_term(&mut trie, t, 1 + i as u64, 1);
        }
        let node = trie.insert("pg").unwrap();
        node.record_phrase("pg rated", PhraseCount::new(0, 2));
        finalize(&mut trie, 20);

        let first = trie.suggest("p", 3).into_vec();
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(first[0].phrase, "pf");
        assert_eq!(first[1].phrase, "pg");

        assert_eq!(first, trie.suggest("p", 3).into_vec());
        assert!(trie.suggest("p", 0).is_empty());
        assert_eq!(trie.suggest("p", 100).len(), 8);
    }

    #[test]
    fn suggest_through_pruned_nodes() {
        let mut trie = Trie::new(1).unwrap();
        add_term(&mut trie, "go", 1, 1);
        add_term(&mut trie, "good", 8, 3);
        finalize(&mut trie, 10);
        trie.prune(2, 2, &HashSet::new());

        let res = trie.suggest("go", 5).into_vec();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].phrase, "good");
    }
}
