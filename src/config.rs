use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::trie::MAX_NGRAM;

const SAMPLE_CONFIG: &str = include_str!("../config.sample.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trie: TrieConfig,
    #[serde(default)]
    pub prune: PruneConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrieConfig {
    /// Longest phrase, in words, recorded against a term.
    #[serde(default = "default_ngram")]
    pub ngram: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PruneConfig {
    #[serde(default)]
    pub min_doc_freq: u64,
    #[serde(default)]
    pub min_term_freq: u64,

    /// File of terms (one per line) that are never pruned.
    #[serde(default)]
    pub protected_terms: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_ngram() -> usize {
    3
}

fn default_max_results() -> usize {
    10
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            ngram: default_ngram(),
        }
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trie.ngram == 0 || self.trie.ngram > MAX_NGRAM {
            return Err(ConfigError::Validation(format!(
                "trie.ngram should be between 1 and {}",
                MAX_NGRAM
            )));
        }
        if self.suggest.max_results == 0 {
            return Err(ConfigError::Validation(
                "suggest.max_results should be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and merge one or more config files. A key set in a later file
/// overrides the same key from earlier ones, whatever its value.
pub fn load_all(paths: &[PathBuf]) -> Result<Config, ConfigError> {
    let mut merged: Option<toml::Table> = None;

    for path in paths {
        log::info!("loading config: {}", path.display());
        let t = read_file(path)?;
        if let Some(ref mut existing) = merged {
            merge(existing, t);
        } else {
            merged = Some(t);
        }
    }

    let merged =
        merged.ok_or_else(|| ConfigError::Validation("no config files specified".to_string()))?;
    let config: Config = toml::Value::Table(merged).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Generate sample config file.
pub fn generate_sample(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::Validation(format!(
            "config file '{}' already exists",
            path.display()
        )));
    }
    std::fs::write(path, SAMPLE_CONFIG)?;
    Ok(())
}

/// Read a TOML file into an untyped table.
fn read_file(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.parse::<toml::Table>()?)
}

/// Merge the src table into dest. Nested tables merge key by key; any other
/// value in src replaces the one in dest.
fn merge(dest: &mut toml::Table, src: toml::Table) {
    for (k, v) in src {
        match (dest.get_mut(&k), v) {
            (Some(toml::Value::Table(d)), toml::Value::Table(s)) => merge(d, s),
            (_, v) => {
                dest.insert(k, v);
            }
        }
    }
}
