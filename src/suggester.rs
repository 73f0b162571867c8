use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::{
    results::Suggestion,
    tokenizer::partial_token,
    trie::Trie,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),
}

/// Summary of a built index.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub nodes: usize,
    pub numdocs: u64,
    pub ngram: usize,
    pub term_norm_factor: f64,
    pub ngram_freq: Vec<u64>,
    pub ngram_count: Vec<u64>,
}

/// A normalized and pruned trie, ready for queries. There is no way to
/// mutate the trie through it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Suggester {
    trie: Trie,
    numdocs: u64,
}

impl Suggester {
    pub(crate) fn new(trie: Trie, numdocs: u64) -> Self {
        Self { trie, numdocs }
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn numdocs(&self) -> u64 {
        self.numdocs
    }

    /// Rank completions of the last (partially typed) word of `query`.
    pub fn suggest(&self, query: &str, num: usize) -> Vec<Suggestion> {
        let Some(prefix) = partial_token(query) else {
            return Vec::new();
        };

        let res = self.trie.suggest(&prefix, num);
        log::debug!("suggest '{}': {} results", prefix, res.len());
        res.into_vec()
    }

    pub fn stats(&self) -> Stats {
        let root = self.trie.root().normalize_count();
        Stats {
            nodes: self.trie.len(),
            numdocs: self.numdocs,
            ngram: self.trie.ngram(),
            term_norm_factor: root.map(|nc| nc.term_norm_factor).unwrap_or(0.0),
            ngram_freq: root.map(|nc| nc.ngram_freq.clone()).unwrap_or_default(),
            ngram_count: root.map(|nc| nc.ngram_count.clone()).unwrap_or_default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut w = BufWriter::new(File::create(path)?);
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .serialize_into(&mut w, self)?;
        w.flush()?;
        log::info!("saved index to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;

        // Bound decoding by the file size so a corrupt length can't allocate.
        let limit = file.metadata()?.len();
        let s: Suggester = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_limit(limit)
            .deserialize_from(BufReader::new(file))?;
        log::info!(
            "loaded index from {} ({} documents)",
            path.display(),
            s.numdocs
        );
        Ok(s)
    }
}
