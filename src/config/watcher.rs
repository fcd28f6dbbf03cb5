// ABOUTME: Filesystem watcher for the config file.
// ABOUTME: Debounces edits and emits coalesced change notifications.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Watches a single config file for changes.
///
/// The parent directory is watched rather than the file itself so that
/// editors which save by renaming a new file into place are still seen.
pub struct ConfigWatcher {
    path: PathBuf,
    changes: mpsc::Receiver<()>,
    _debouncer: Option<Debouncer<RecommendedWatcher>>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("path", &self.path)
            .finish()
    }
}

impl ConfigWatcher {
    pub fn watch(path: &Path, debounce: Duration) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| Error::InvalidConfig(format!("not a file path: {}", path.display())))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // Capacity 1: a burst of edits while the daemon is busy is one change.
        let (tx, changes) = mpsc::channel(1);

        let mut debouncer = new_debouncer(debounce, move |res: DebounceEventResult| match res {
            Ok(events) => {
                if events
                    .iter()
                    .any(|e| e.path.file_name() == Some(file_name.as_os_str()))
                {
                    let _ = tx.try_send(());
                }
            }
            Err(e) => tracing::warn!("config watcher error: {}", e),
        })?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::debug!(path = %path.display(), "watching config file");

        Ok(Self {
            path: path.to_path_buf(),
            changes,
            _debouncer: Some(debouncer),
        })
    }

    /// A watcher fed by hand instead of by the filesystem.
    #[cfg(test)]
    pub(crate) fn from_channel(path: &Path, changes: mpsc::Receiver<()>) -> Self {
        Self {
            path: path.to_path_buf(),
            changes,
            _debouncer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next change. Returns `None` once the watcher has shut down.
    pub async fn changed(&mut self) -> Option<()> {
        self.changes.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_a_write_to_the_watched_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "images: []\n").unwrap();

        let mut watcher = ConfigWatcher::watch(&path, Duration::from_millis(50)).unwrap();
        std::fs::write(&path, "images: []\nremoteRepos: []\n").unwrap();

        let changed = tokio::time::timeout(Duration::from_secs(5), watcher.changed()).await;
        assert_eq!(changed.unwrap(), Some(()));
    }

    #[test]
    fn rejects_paths_without_file_name() {
        assert!(ConfigWatcher::watch(Path::new("/"), Duration::from_millis(50)).is_err());
    }
}
