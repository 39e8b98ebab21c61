//! Watch Mode
//!
//! Re-runs a check whenever a coverage profile or the configuration changes.
//!
//! ## Flow
//!
//! ```text
//! notify ──► FileWatcher (filter) ──► mpsc ──► run_watch ──► on_change
//!                                                 ▲
//!                               cancel (oneshot) ─┘
//! ```
//!
//! `run_watch` handles one change at a time: the callback runs to completion
//! before the next notification is received, so at most one evaluation is
//! in flight.

use crate::result::{CovgateError, CovgateResult};
use glob::Pattern;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Which paths trigger a re-run
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// File extensions that trigger (without the dot); empty accepts all
    pub extensions: Vec<String>,
    /// Directory names or glob patterns to ignore
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            extensions: ["out", "info", "xml", "yaml", "yml"]
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            ignore: ["target", ".git", "node_modules", "*.tmp"]
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

impl WatchConfig {
    /// Create a new watch config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triggering extension
    #[must_use]
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extensions.push(ext.trim_start_matches('.').to_string());
        self
    }

    /// Add an ignore entry
    #[must_use]
    pub fn with_ignore(mut self, pattern: &str) -> Self {
        self.ignore.push(pattern.to_string());
        self
    }

    /// Whether a changed path should trigger a re-run
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        if self.is_ignored(path) {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let slash = path.to_string_lossy().replace('\\', "/");
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

        self.ignore.iter().any(|entry| {
            if !entry.contains(['*', '?', '[']) {
                return path
                    .components()
                    .any(|c| matches!(c, Component::Normal(n) if n.to_str() == Some(entry.as_str())));
            }
            let Ok(pattern) = Pattern::new(entry) else {
                return false;
            };
            if entry.contains('/') {
                pattern.matches(&slash)
            } else {
                pattern.matches(file_name)
            }
        })
    }
}

/// A file change notification
#[derive(Debug, Clone)]
pub struct FileChange {
    /// The changed file path
    pub path: PathBuf,
    /// Type of change
    pub kind: FileChangeKind,
    /// When the change was observed
    pub timestamp: Instant,
}

impl FileChange {
    /// A change observed now
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FileChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Instant::now(),
        }
    }
}

/// Kind of file change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileChangeKind {
    Created,
    Modified,
    Deleted,
    Other,
}

#[cfg(feature = "watch")]
impl From<notify::EventKind> for FileChangeKind {
    fn from(kind: notify::EventKind) -> Self {
        use notify::EventKind;
        match kind {
            EventKind::Create(_) => Self::Created,
            EventKind::Modify(_) => Self::Modified,
            EventKind::Remove(_) => Self::Deleted,
            EventKind::Any | EventKind::Access(_) | EventKind::Other => Self::Other,
        }
    }
}

/// Filesystem watcher feeding an async channel
#[cfg(feature = "watch")]
pub struct FileWatcher {
    config: WatchConfig,
    watcher: notify::RecommendedWatcher,
    receiver: Option<mpsc::UnboundedReceiver<FileChange>>,
    watched: Vec<PathBuf>,
}

#[cfg(feature = "watch")]
impl FileWatcher {
    /// Create a watcher; nothing is watched until [`FileWatcher::watch_dir`]
    pub fn new(config: WatchConfig) -> CovgateResult<Self> {
        use notify::{Event, Watcher};

        let (tx, rx) = mpsc::unbounded_channel();
        let filter = config.clone();
        let watcher = notify::RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let kind = FileChangeKind::from(event.kind);
                    for path in event.paths {
                        if filter.matches(&path) {
                            // receiver gone means the loop ended
                            let _ = tx.send(FileChange::new(path, kind));
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "file watcher error"),
            },
            notify::Config::default(),
        )
        .map_err(|e| CovgateError::watch(format!("failed to create watcher: {e}")))?;

        Ok(Self {
            config,
            watcher,
            receiver: Some(rx),
            watched: Vec::new(),
        })
    }

    /// Watch a directory recursively
    pub fn watch_dir(&mut self, path: &Path) -> CovgateResult<()> {
        use notify::{RecursiveMode, Watcher};

        self.watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| CovgateError::watch(format!("failed to watch {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "watching");
        self.watched.push(path.to_path_buf());
        Ok(())
    }

    /// Hand out the change stream; only the first call succeeds
    pub fn events(&mut self) -> CovgateResult<mpsc::UnboundedReceiver<FileChange>> {
        self.receiver
            .take()
            .ok_or_else(|| CovgateError::watch("event stream already taken"))
    }

    /// Directories being watched
    #[must_use]
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    /// The filter configuration
    #[must_use]
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }
}

#[cfg(feature = "watch")]
impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("config", &self.config)
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

/// Counters for a watch session
#[derive(Debug, Clone, Default)]
pub struct WatchStats {
    /// Callbacks run
    pub trigger_count: u64,
    /// Callbacks that returned an error
    pub error_count: u64,
    /// Time of last trigger
    pub last_trigger: Option<Instant>,
}

impl WatchStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one callback run
    pub fn record_trigger(&mut self, failed: bool) {
        self.trigger_count += 1;
        if failed {
            self.error_count += 1;
        }
        self.last_trigger = Some(Instant::now());
    }
}

/// Run `on_change` for every change until cancelled or the stream ends
///
/// A message on `cancel` ends the loop with [`CovgateError::Cancelled`]
/// carrying that reason; dropping the cancel sender does the same. A closed
/// change stream ends the loop normally. Callback errors are logged and the
/// loop keeps going.
pub async fn run_watch<F>(
    mut events: mpsc::UnboundedReceiver<FileChange>,
    mut cancel: oneshot::Receiver<String>,
    mut on_change: F,
) -> CovgateResult<WatchStats>
where
    F: FnMut(&FileChange) -> CovgateResult<()>,
{
    let mut stats = WatchStats::new();

    loop {
        tokio::select! {
            biased;

            reason = &mut cancel => {
                let reason = reason.unwrap_or_else(|_| "cancel handle dropped".to_string());
                tracing::info!(%reason, triggers = stats.trigger_count, "watch cancelled");
                return Err(CovgateError::cancelled(reason));
            }

            change = events.recv() => {
                let Some(change) = change else {
                    tracing::info!(triggers = stats.trigger_count, "change stream closed");
                    return Ok(stats);
                };
                tracing::debug!(path = %change.path.display(), kind = ?change.kind, "change detected");
                let result = on_change(&change);
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "check failed during watch");
                }
                stats.record_trigger(result.is_err());
            }
        }
    }
}
