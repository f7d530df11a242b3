use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Record of entry ids that have already been published.
///
/// Persisted as one id per line, append-only. A failed `record` must be
/// treated as fatal by the caller: losing a write means a later run would
/// publish the same entry again.
pub trait PublishLedger {
    fn has(&self, id: &str) -> bool;
    fn record(&mut self, id: &str) -> Result<()>;
}

/// Create an empty ledger file if none exists yet.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create ledger directory: {}", parent.display()))?;
    }
    File::create(path)
        .with_context(|| format!("Failed to create ledger file: {}", path.display()))?;
    Ok(())
}

fn append_line(path: &Path, id: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open ledger for append: {}", path.display()))?;
    writeln!(file, "{}", id)
        .with_context(|| format!("Failed to append to ledger: {}", path.display()))?;
    file.flush()?;
    Ok(())
}

/// Ledger that rescans the file on every lookup.
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PublishLedger for FileLedger {
    fn has(&self, id: &str) -> bool {
        // Unreadable ledger reads as empty (first run).
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return false,
        };
        BufReader::new(file)
            .lines()
            .map_while(|line| line.ok())
            .any(|line| line.trim_end_matches('\r') == id)
    }

    fn record(&mut self, id: &str) -> Result<()> {
        append_line(&self.path, id)
    }
}

/// Ledger that reads the file once into a set and keeps it in step with appends.
pub struct IndexedLedger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl IndexedLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(|l| l.trim_end_matches('\r'))
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ledger unreadable, starting empty");
                HashSet::new()
            }
        };
        Self { path, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl PublishLedger for IndexedLedger {
    fn has(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn record(&mut self, id: &str) -> Result<()> {
        append_line(&self.path, id)?;
        self.ids.insert(id.to_string());
        Ok(())
    }
}
