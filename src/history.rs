//! Session input history
//!
//! Keeps every distinct submitted line once. Re-recording a line moves it to
//! the most-recent position instead of adding a second copy. Lookups go
//! through a text index so promotion does not scan the whole history.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Ordered, duplicate-free list of past input lines
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    /// Text -> sequence number of its single occurrence
    index: HashMap<String, u64>,
    /// Sequence number -> text, oldest first
    entries: BTreeMap<u64, String>,
    /// Next sequence number to hand out
    next_seq: u64,
    /// Maximum number of entries, `None` for unbounded
    limit: Option<usize>,
}

impl HistoryStore {
    /// Create an unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that evicts the oldest entries beyond `limit`
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Record a line, promoting it if it already exists.
    ///
    /// Blank lines are ignored. Returns `true` if the history changed.
    pub fn record(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }

        if let Some(old_seq) = self.index.get(line).copied() {
            if old_seq + 1 == self.next_seq {
                // Already the most recent entry
                return false;
            }
            self.entries.remove(&old_seq);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(line.to_string(), seq);
        self.entries.insert(seq, line.to_string());

        self.enforce_limit();
        true
    }

    /// Entries, most recent first
    pub fn entries(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.values().rev().map(String::as_str)
    }

    /// Entries, oldest first (the order line editors expect to be fed)
    pub fn oldest_first(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.values().map(String::as_str)
    }

    /// Most recently recorded line
    pub fn latest(&self) -> Option<&str> {
        self.entries.values().next_back().map(String::as_str)
    }

    pub fn contains(&self, line: &str) -> bool {
        self.index.contains_key(line.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Change the bound, evicting immediately if needed
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.enforce_limit();
    }

    /// Entries containing `query`, most recent first
    pub fn search(&self, query: &str) -> Vec<&str> {
        self.entries().filter(|entry| entry.contains(query)).collect()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    /// Append lines from a plain-text file (one entry per line, oldest first).
    ///
    /// A missing file is not an error.
    pub fn load(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }

        let reader = BufReader::new(File::open(path)?);
        let mut loaded = 0;
        for line in reader.lines() {
            if self.record(&line?) {
                loaded += 1;
            }
        }

        debug!("Loaded {} history entries from {}", loaded, path.display());
        Ok(loaded)
    }

    /// Write all entries to a plain-text file, oldest first
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        for entry in self.oldest_first() {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };

        while self.entries.len() > limit {
            if let Some((_, evicted)) = self.entries.pop_first() {
                self.index.remove(&evicted);
            }
        }
    }
}
