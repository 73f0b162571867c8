use serde::{Deserialize, Serialize};

use super::{TrieError, TrieNode};

/// Statistics aggregated over the subtree rooted at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeCount {
    /// Sum of `term_freq * log10(numdocs / doc_freq)` over the subtree.
    pub term_norm_factor: f64,

    /// Sum of normalized phrase scores stored on this node.
    pub phrase_norm_factor: f64,

    /// Raw phrase occurrences per n-gram order (index 0 is unigrams).
    pub ngram_freq: Vec<u64>,

    /// Distinct phrases per n-gram order (index 0 is unigrams).
    pub ngram_count: Vec<u64>,
}

impl NormalizeCount {
    pub fn new(ngram: usize) -> Self {
        Self {
            term_norm_factor: 0.0,
            phrase_norm_factor: 0.0,
            ngram_freq: vec![0; ngram],
            ngram_count: vec![0; ngram],
        }
    }

    /// Fold a child's subtree totals in. The phrase factor is node-local and is
    /// not carried up.
    pub fn add(&mut self, child: &NormalizeCount) {
        self.term_norm_factor += child.term_norm_factor;
        for (i, (f, n)) in child
            .ngram_freq
            .iter()
            .zip(child.ngram_count.iter())
            .enumerate()
        {
            self.ngram_freq[i] += f;
            self.ngram_count[i] += n;
        }
    }

    /// Per-order `ln(1 + mean frequency)`, read off the root aggregate and fed
    /// to phrase normalization. Orders with no phrases get 1.0.
    pub fn log_average_frequencies(&self) -> Vec<f64> {
        self.ngram_freq
            .iter()
            .zip(self.ngram_count.iter())
            .map(|(&freq, &count)| {
                if count == 0 {
                    1.0
                } else {
                    (1.0 + freq as f64 / count as f64).ln()
                }
            })
            .collect()
    }
}

impl TrieNode {
    /// Recompute this node's aggregate from its own term and phrase counts plus
    /// the aggregates of all children, store it and return it.
    pub(super) fn compute_term_normalization(
        &mut self,
        numdocs: u64,
        ngram: usize,
    ) -> Result<NormalizeCount, TrieError> {
        let mut nc = NormalizeCount::new(ngram);

        if self.doc_freq > 0 {
            self.numdocs = numdocs;
            nc.term_norm_factor += idf_mass(self.term_freq, self.doc_freq, numdocs);
        }

        for p in self.phrases.values() {
            let order = p.counter.order(ngram)?;
            nc.ngram_freq[order - 1] += p.counter.count;
            nc.ngram_count[order - 1] += 1;
        }

        for child in self.children.values_mut() {
            let sub = child.compute_term_normalization(numdocs, ngram)?;
            nc.add(&sub);
        }

        self.norm = Some(nc.clone());
        Ok(nc)
    }

    pub(super) fn normalize_phrases(
        &mut self,
        logavgfreq: &[f64],
        ngram: usize,
    ) -> Result<(), TrieError> {
        if !self.phrases.is_empty() {
            let nc = self
                .norm
                .as_mut()
                .ok_or_else(|| TrieError::NotNormalized(self.prefix.clone()))?;

            // Score every phrase before writing any, so a bad counter leaves
            // the node untouched.
            let mut scores = Vec::with_capacity(self.phrases.len());
            for p in self.phrases.values() {
                let order = p.counter.order(ngram)?;
                let avg = logavgfreq[order - 1];
                if !avg.is_finite() || avg <= 0.0 {
                    return Err(TrieError::InvalidAverage { order, value: avg });
                }
                scores.push(p.counter.count as f64 / avg);
            }

            for (p, v) in self.phrases.values_mut().zip(&scores) {
                p.normalized = Some(*v);
            }
            nc.phrase_norm_factor = scores.iter().sum();
        } else if let Some(nc) = self.norm.as_mut() {
            nc.phrase_norm_factor = 0.0;
        }

        for child in self.children.values_mut() {
            child.normalize_phrases(logavgfreq, ngram)?;
        }

        Ok(())
    }
}

/// IDF weighted term mass. Callers guarantee `doc_freq > 0`.
pub(super) fn idf_mass(term_freq: u64, doc_freq: u64, numdocs: u64) -> f64 {
    term_freq as f64 * (numdocs as f64 / doc_freq as f64).log10()
}
