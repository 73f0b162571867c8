use std::{
    collections::HashSet,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::{
    config::PruneConfig,
    suggester::Suggester,
    tokenizer::{SimpleTokenizer, Tokenizer},
    trie::{PhraseCount, Trie, TrieError},
};

const LOG_EVERY: u64 = 10_000;

/// Longest term, in chars, that is indexed. Every char is one trie level and
/// every pass recurses once per level.
pub const MAX_TERM_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("trie error: {0}")]
    Trie(#[from] TrieError),
    #[error("corpus has no documents")]
    EmptyCorpus,
}

/// Builds a trie from documents. Consumed by `finish`, which runs the
/// normalization and pruning passes and hands back a read-only `Suggester`.
pub struct Indexer {
    trie: Trie,
    numdocs: u64,
    tokenizer: Box<dyn Tokenizer>,
}

impl Indexer {
    pub fn new(ngram: usize) -> Result<Self, Error> {
        Ok(Self::with_tokenizer(ngram, Box::new(SimpleTokenizer))?)
    }

    pub fn with_tokenizer(ngram: usize, tokenizer: Box<dyn Tokenizer>) -> Result<Self, TrieError> {
        Ok(Self {
            trie: Trie::new(ngram)?,
            numdocs: 0,
            tokenizer,
        })
    }

    pub fn numdocs(&self) -> u64 {
        self.numdocs
    }

    /// Index one document. Every token counts towards its term frequency, and
    /// once towards its document frequency. Each token also records the
    /// phrases of 1..=N words starting at it. Tokens longer than
    /// `MAX_TERM_LEN` are dropped. Returns false if nothing was left to index.
    pub fn add_document(&mut self, text: &str) -> Result<bool, Error> {
        let mut tokens = self.tokenizer.tokenize(text);
        tokens.retain(|t| {
            let n = t.chars().count();
            if n > MAX_TERM_LEN {
                log::warn!("skipping {} char token (max {})", n, MAX_TERM_LEN);
                return false;
            }
            true
        });
        if tokens.is_empty() {
            return Ok(false);
        }

        self.numdocs += 1;
        let ngram = self.trie.ngram();
        let mut seen: HashSet<&str> = HashSet::new();

        for (i, tok) in tokens.iter().enumerate() {
            let node = self.trie.insert(tok)?;
            node.term_freq += 1;
            if seen.insert(tok.as_str()) {
                node.doc_freq += 1;
            }

            for n in 1..=ngram.min(tokens.len() - i) {
                let phrase = tokens[i..i + n].join(" ");
                node.record_phrase(&phrase, PhraseCount::new(0, n));
            }
        }

        Ok(true)
    }

    /// Index a corpus file where each non-blank line is a document.
    pub fn add_file(&mut self, path: &Path) -> Result<(), Error> {
        log::info!("indexing documents from {} ...", path.display());

        let file = std::fs::File::open(path)?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if self.add_document(&line)? && self.numdocs % LOG_EVERY == 0 {
                log::info!("indexed {} documents", self.numdocs);
            }
        }

        log::info!(
            "finished. indexed {} documents into {} trie nodes",
            self.numdocs,
            self.trie.len()
        );
        Ok(())
    }

    /// Run term normalization, phrase normalization and pruning, in that order.
    pub fn finish(
        mut self,
        prune: &PruneConfig,
        protected: &HashSet<String>,
    ) -> Result<Suggester, Error> {
        if self.numdocs == 0 {
            return Err(Error::EmptyCorpus);
        }

        log::info!("computing term normalization over {} documents", self.numdocs);
        let root = self.trie.compute_term_normalization(self.numdocs)?;

        let logavgfreq = root.log_average_frequencies();
        for (i, avg) in logavgfreq.iter().enumerate() {
            log::info!(
                "{}-gram: {} phrases, {} occurrences, log avg freq {:.4}",
                i + 1,
                root.ngram_count[i],
                root.ngram_freq[i],
                avg
            );
        }

        log::info!("normalizing phrases");
        self.trie.normalize_phrases(&logavgfreq)?;

        log::info!(
            "pruning (min doc freq {}, min term freq {}, {} protected terms)",
            prune.min_doc_freq,
            prune.min_term_freq,
            protected.len()
        );
        self.trie.prune(prune.min_doc_freq, prune.min_term_freq, protected);

        Ok(Suggester::new(self.trie, self.numdocs))
    }
}
