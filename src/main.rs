mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;

use cli::Commands;
use suggestrie::{config, ingest::Indexer, init, Suggester};

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    init::init_logger();

    let cli = cli::Cli::parse();

    match cli.command {
        // Generate a new config file.
        Commands::NewConfig { path } => {
            if let Err(e) = config::generate_sample(&path) {
                log::error!("error generating config: {}", e);
                std::process::exit(1);
            }
            log::info!("config file generated: {}", path.display());
        }

        // Index a corpus, normalize, prune and save.
        Commands::Build {
            corpus,
            out,
            protected,
        } => {
            let cfg = load_config(&cli.config);

            let protected_path =
                protected.unwrap_or_else(|| PathBuf::from(&cfg.prune.protected_terms));
            let protected = init::load_protected_terms(&protected_path).unwrap_or_else(|e| {
                log::error!(
                    "error loading protected terms {}: {}",
                    protected_path.display(),
                    e
                );
                std::process::exit(1);
            });

            let mut ix = Indexer::new(cfg.trie.ngram).unwrap_or_else(|e| {
                log::error!("error initializing indexer: {}", e);
                std::process::exit(1);
            });
            if let Err(e) = ix.add_file(&corpus) {
                log::error!("error indexing {}: {}", corpus.display(), e);
                std::process::exit(1);
            }

            let s = ix.finish(&cfg.prune, &protected).unwrap_or_else(|e| {
                log::error!("error building index: {}", e);
                std::process::exit(1);
            });

            if let Err(e) = s.save(&out) {
                log::error!("error saving index {}: {}", out.display(), e);
                std::process::exit(1);
            }
        }

        // Query a saved index.
        Commands::Suggest { index, num, query } => {
            let cfg = load_config(&cli.config);
            let s = load_index(&index);

            let num = num.unwrap_or(cfg.suggest.max_results);
            for r in s.suggest(&query, num) {
                match serde_json::to_string(&r) {
                    Ok(line) => println!("{}", line),
                    Err(e) => {
                        log::error!("error encoding result: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Stats { index } => {
            let s = load_index(&index);
            match serde_json::to_string_pretty(&s.stats()) {
                Ok(out) => println!("{}", out),
                Err(e) => {
                    log::error!("error encoding stats: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Load config files or exit.
fn load_config(paths: &[PathBuf]) -> config::Config {
    config::load_all(paths).unwrap_or_else(|e| {
        log::error!("error loading config: {}", e);
        std::process::exit(1);
    })
}

/// Load a saved index or exit with an error message.
fn load_index(path: &Path) -> Suggester {
    if !path.exists() {
        log::error!(
            "index '{}' not found. Run `build` to create one.",
            path.display()
        );
        std::process::exit(1);
    }

    Suggester::load(path).unwrap_or_else(|e| {
        log::error!("error loading index {}: {}", path.display(), e);
        std::process::exit(1);
    })
}
