use std::{
    collections::HashSet,
    io::{BufRead, BufReader},
    path::Path,
};

/// Initialize logger.
pub fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            use std::io::Write;
            let level = if record.level() != log::Level::Info {
                format!("[{}] ", record.level())
            } else {
                String::new()
            };
            writeln!(
                buf,
                "{} {}:{} {}{}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                level,
                record.args()
            )
        })
        .init();
}

/// Load the set of terms exempt from pruning: one term per line, lowercased.
/// Blank lines and lines starting with '#' are skipped. An empty path yields
/// an empty set.
pub fn load_protected_terms(path: &Path) -> Result<HashSet<String>, std::io::Error> {
    let mut out = HashSet::new();
    if path == Path::new("") {
        return Ok(out);
    }

    let file = std::fs::File::open(path)?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        let term = line.trim();
        if term.is_empty() || term.starts_with('#') {
            continue;
        }
        out.insert(term.to_lowercase());
    }

    log::info!(
        "loaded {} protected terms from {}",
        out.len(),
        path.display()
    );
    Ok(out)
}
