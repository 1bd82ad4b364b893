//! Shell-style prompt history: the canonical producer of external value
//! updates for the composer.
//!
//! The history component is deliberately decoupled from the composer. The
//! owner asks [`PromptHistory::should_navigate`] whether an Up/Down press is
//! history navigation (rather than ordinary cursor movement), then feeds the
//! recalled entry back through
//! [`crate::Composer::sync_external_value`] with a cursor nudge of 0 so the
//! cursor lands at the start of the recalled text.
//!
//! Entries persist as JSON lines; the file is rewritten atomically through a
//! sibling temp file and truncated to the configured capacity.

use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryEntry {
    ts: u64,
    text: String,
}

pub struct PromptHistory {
    entries: Vec<HistoryEntry>,
    history_path: Option<PathBuf>,
    capacity: usize,

    /// Position within `entries` while the user is browsing; `None` when not
    /// browsing.
    browse_cursor: Option<usize>,

    /// The text most recently recalled into the composer. Decides whether
    /// further Up/Down presses keep navigating or revert to cursor movement.
    last_recalled: Option<String>,
}

impl PromptHistory {
    /// History persisted under the user's home directory
    /// (`~/.prompt-composer/history.jsonl`).
    pub fn new(capacity: usize) -> Self {
        Self::with_path(default_history_path(), capacity)
    }

    /// History persisted at `path`, or in-memory only when `path` is `None`.
    pub fn with_path(path: Option<PathBuf>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = path.as_deref().map(load_entries).unwrap_or_default();
        if entries.len() > capacity {
            entries.drain(0..entries.len() - capacity);
        }
        Self {
            entries,
            history_path: path,
            capacity,
            browse_cursor: None,
            last_recalled: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a submitted prompt. Empty text and a repeat of the newest
    /// entry are skipped.
    pub fn record_submission(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.reset_navigation();

        if self.entries.last().is_some_and(|prev| prev.text == text) {
            return;
        }
        self.entries.push(HistoryEntry {
            ts: unix_timestamp_secs(),
            text: text.to_string(),
        });
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(0..overflow);
        }

        if let Some(path) = self.history_path.as_deref()
            && let Err(err) = persist_entries(path, &self.entries)
        {
            tracing::warn!("failed to persist prompt history to {}: {err}", path.display());
        }
    }

    /// Forget the browsing position so the next Up starts from the newest
    /// entry.
    pub fn reset_navigation(&mut self) {
        self.browse_cursor = None;
        self.last_recalled = None;
    }

    /// Whether an Up/Down press should recall history given the composer's
    /// current text and cursor. Navigation only triggers on an empty field,
    /// or at offset 0 while the text still matches the last recalled entry,
    /// so ordinary editing is never hijacked.
    pub fn should_navigate(&self, text: &str, cursor: usize) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        if text.is_empty() {
            return true;
        }
        if cursor != 0 {
            return false;
        }
        self.last_recalled.as_deref() == Some(text)
    }

    /// Recall the previous (older) entry, skipping entries equal to
    /// `current_text`.
    pub fn navigate_up(&mut self, current_text: &str) -> Option<String> {
        let mut idx = match self.browse_cursor {
            None => self.entries.len().checked_sub(1)?,
            Some(0) => return None,
            Some(idx) => idx - 1,
        };
        loop {
            let entry = self.entries.get(idx)?;
            if entry.text != current_text {
                self.browse_cursor = Some(idx);
                self.last_recalled = Some(entry.text.clone());
                return Some(entry.text.clone());
            }
            idx = idx.checked_sub(1)?;
        }
    }

    /// Recall the next (newer) entry; walking past the newest one leaves
    /// browsing mode and clears the field.
    pub fn navigate_down(&mut self, current_text: &str) -> Option<String> {
        let mut idx = match self.browse_cursor {
            None => return None,
            Some(idx) if idx + 1 >= self.entries.len() => {
                self.reset_navigation();
                return Some(String::new());
            }
            Some(idx) => idx + 1,
        };
        while let Some(entry) = self.entries.get(idx) {
            if entry.text != current_text {
                self.browse_cursor = Some(idx);
                self.last_recalled = Some(entry.text.clone());
                return Some(entry.text.clone());
            }
            idx += 1;
        }
        self.reset_navigation();
        Some(String::new())
    }
}

fn unix_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn default_history_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".prompt-composer").join("history.jsonl"))
}

fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            tracing::warn!("failed to read prompt history from {}: {err}", path.display());
            return Vec::new();
        }
    };

    contents
        .lines()
        .filter_map(|line| serde_json::from_str::<HistoryEntry>(line.trim()).ok())
        .filter(|entry| !entry.text.is_empty())
        .collect()
}

fn persist_entries(path: &Path, entries: &[HistoryEntry]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("history path has no parent directory"))?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    for entry in entries {
        let line = serde_json::to_string(entry).map_err(|err| io::Error::other(err.to_string()))?;
        writeln!(tmp, "{line}")?;
    }
    tmp.flush()?;

    match tmp.persist(path) {
        Ok(_) => Ok(()),
        Err(err) => {
            // Rename won't overwrite on every platform; retry after removal.
            let _ = std::fs::remove_file(path);
            err.file.persist(path).map(|_| ()).map_err(|err| err.error)
        }
    }
}
