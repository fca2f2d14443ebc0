use crate::error::{HistoryError, Result};
use crate::types::HistoryEntry;
use async_trait::async_trait;
use claimcheck_verdict::{Claim, VerdictResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Destination for finished verdicts.
#[async_trait]
pub trait VerdictSink: Send + Sync {
    async fn record(&self, claim: &Claim, result: &VerdictResult) -> Result<HistoryEntry>;

    /// Most recent entries first.
    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Removes every entry, returning how many were removed.
    async fn clear(&self) -> Result<usize>;
}

/// Append-only JSON Lines file, one entry per line.
pub struct JsonlHistory {
    path: PathBuf,
    // Serializes writers; caches the next id once the file has been read.
    next_id: Mutex<Option<u64>>,
}

impl JsonlHistory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            next_id: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.read_log().await?.0)
    }

    /// Entries in file order plus the next free id.
    ///
    /// A clear leaves a `{"next_id":N}` line behind so ids are never reused by a later
    /// process.
    async fn read_log(&self) -> Result<(Vec<HistoryEntry>, u64)> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 1)),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut next_id = 1;
        for (idx, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parsed = serde_json::from_str(line).map_err(|e| HistoryError::Corrupt {
                line: idx + 1,
                reason: e.to_string(),
            })?;
            match parsed {
                LogLine::Entry(entry) => {
                    next_id = next_id.max(entry.id + 1);
                    entries.push(entry);
                }
                LogLine::Mark { next_id: mark } => next_id = next_id.max(mark),
            }
        }
        Ok((entries, next_id))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogLine {
    Entry(HistoryEntry),
    Mark { next_id: u64 },
}

#[derive(Serialize)]
struct Mark {
    next_id: u64,
}

#[async_trait]
impl VerdictSink for JsonlHistory {
    async fn record(&self, claim: &Claim, result: &VerdictResult) -> Result<HistoryEntry> {
        let mut next_id = self.next_id.lock().await;
        let id = match *next_id {
            Some(id) => id,
            None => self.read_log().await?.1,
        };

        let entry = HistoryEntry::new(id, claim, result);
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        *next_id = Some(id + 1);
        log::debug!("Recorded check #{} to {}", id, self.path.display());
        Ok(entry)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let _guard = self.next_id.lock().await;
        let mut entries = self.read_all().await?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    async fn clear(&self) -> Result<usize> {
        let mut next_id = self.next_id.lock().await;
        let (entries, logged_next) = self.read_log().await?;
        let removed = entries.len();
        let next = next_id.unwrap_or(logged_next).max(logged_next);
        if removed > 0 || next > 1 {
            let mut mark = serde_json::to_string(&Mark { next_id: next })?;
            mark.push('\n');
            tokio::fs::write(&self.path, mark).await?;
        }
        *next_id = Some(next);
        log::info!("Cleared {} history entries", removed);
        Ok(removed)
    }
}

/// In-process history, lost on exit.
#[derive(Default)]
pub struct MemoryHistory {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    entries: Vec<HistoryEntry>,
    next_id: u64,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerdictSink for MemoryHistory {
    async fn record(&self, claim: &Claim, result: &VerdictResult) -> Result<HistoryEntry> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let entry = HistoryEntry::new(state.next_id, claim, result);
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let state = self.state.lock().await;
        Ok(state.entries.iter().rev().take(limit).cloned().collect())
    }

    async fn clear(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        let removed = state.entries.len();
        state.entries.clear();
        Ok(removed)
    }
}
