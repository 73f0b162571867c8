use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "suggestrie")]
#[command(about = "suggestrie - ranked query autocompletion from a text corpus.")]
#[command(version = env!("VERSION"))]
pub struct Cli {
    /// Path to one or more config files (merged in order).
    #[arg(long, default_value = "config.toml", action = clap::ArgAction::Append)]
    pub config: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a sample config file.
    NewConfig {
        /// Output path for config file.
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,
    },

    /// Build an index from a corpus file (one document per line).
    Build {
        /// Corpus file to index.
        #[arg(long)]
        corpus: PathBuf,

        /// Output path for the index.
        #[arg(long, default_value = "index.bin")]
        out: PathBuf,

        /// File of terms exempt from pruning. Overrides prune.protected_terms.
        #[arg(long)]
        protected: Option<PathBuf>,
    },

    /// Print ranked completions for a query, one JSON object per line.
    Suggest {
        /// Index file generated by `build`.
        #[arg(long, default_value = "index.bin")]
        index: PathBuf,

        /// Maximum number of suggestions. Defaults to suggest.max_results.
        #[arg(short, long)]
        num: Option<usize>,

        /// Query text. The last word is completed.
        query: String,
    },

    /// Print index statistics as JSON.
    Stats {
        /// Index file generated by `build`.
        #[arg(long, default_value = "index.bin")]
        index: PathBuf,
    },
}
