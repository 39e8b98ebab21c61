//! History persistence.

use super::{History, HistoryEntry};
use crate::result::{CovgateError, CovgateResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only storage for history entries
pub trait HistoryStore: Send + Sync {
    /// Load the full history; a store with nothing recorded yields an empty history
    fn load(&self) -> CovgateResult<History>;

    /// Append one entry
    fn append(&self, entry: HistoryEntry) -> CovgateResult<()>;
}

/// History kept as a JSON document (`{"entries": [...]}`)
///
/// Appends rewrite the document through a temporary file and a rename, so a
/// reader never sees a half-written file. Concurrent writers from separate
/// processes are not coordinated.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    /// Create a store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> CovgateResult<History> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no history file yet");
            return Ok(History::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(History::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            CovgateError::history(format!("corrupt history file {}: {e}", self.path.display()))
        })
    }

    fn append(&self, entry: HistoryEntry) -> CovgateResult<()> {
        let mut history = self.load()?;
        history.push(entry);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_string_pretty(&history)?)?;
        fs::rename(&temp, &self.path)?;

        tracing::debug!(path = %self.path.display(), entries = history.len(), "history appended");
        Ok(())
    }
}

/// In-process store, used for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    history: Mutex<History>,
}

impl MemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing history
    #[must_use]
    pub fn with_history(history: History) -> Self {
        Self {
            history: Mutex::new(history),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> CovgateResult<History> {
        self.history
            .lock()
            .map(|h| h.clone())
            .map_err(|_| CovgateError::history("history lock poisoned"))
    }

    fn append(&self, entry: HistoryEntry) -> CovgateResult<()> {
        self.history
            .lock()
            .map(|mut h| h.push(entry))
            .map_err(|_| CovgateError::history("history lock poisoned"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::history::tests::entry;

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("history.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("nested/history.json"));
        store.append(entry(70.0)).unwrap();
        store.append(entry(75.0)).unwrap();

        let history = store.load().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().overall, 75.0);
        assert!(!dir.path().join("nested/history.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_history_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();
        let err = JsonHistoryStore::new(&path).load().unwrap_err();
        assert!(matches!(err, CovgateError::History { .. }));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryHistoryStore::new();
        store.append(entry(80.0)).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
