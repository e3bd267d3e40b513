// SPDX-License-Identifier: MIT OR Apache-2.0
//! Manifest watcher for live stage reloading.
//!
//! Watches the directory holding the stage manifest and reports debounced
//! changes to the manifest file itself. Editors often save by writing a
//! temporary file and renaming it, so the parent directory is watched
//! rather than the file.

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

/// Default debounce for manifest edits
pub const MANIFEST_DEBOUNCE: Duration = Duration::from_millis(250);

/// Events emitted by the manifest watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEvent {
    /// The manifest was created or modified
    Changed(PathBuf),
    /// The manifest was deleted
    Removed(PathBuf),
    /// The watcher reported an error
    Error(String),
}

/// Debounced watcher for a single manifest file
pub struct ManifestWatcher {
    /// The underlying debounced watcher
    _watcher: Debouncer<RecommendedWatcher, RecommendedCache>,
    /// Receiver for manifest events
    event_rx: Receiver<ManifestEvent>,
    /// Manifest being watched
    path: PathBuf,
    /// Number of raw events seen, for diagnostics
    seen: Arc<Mutex<u64>>,
}

impl ManifestWatcher {
    /// Start watching `path`
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> Result<Self, notify::Error> {
        let path = path.as_ref().to_path_buf();
        let file_name = path.file_name().map(|n| n.to_os_string());
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let (event_tx, event_rx) = mpsc::channel();
        let seen = Arc::new(Mutex::new(0u64));
        let seen_in_handler = Arc::clone(&seen);

        let mut watcher = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        *seen_in_handler.lock() += 1;

                        let Some(hit) = event
                            .paths
                            .iter()
                            .find(|p| p.file_name().map(|n| n.to_os_string()) == file_name)
                            .cloned()
                        else {
                            continue;
                        };

                        use notify::EventKind;
                        let message = match event.kind {
                            EventKind::Create(_) | EventKind::Modify(_) => ManifestEvent::Changed(hit),
                            EventKind::Remove(_) => ManifestEvent::Removed(hit),
                            EventKind::Any | EventKind::Access(_) | EventKind::Other => continue,
                        };
                        let _ = event_tx.send(message);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let _ = event_tx.send(ManifestEvent::Error(error.to_string()));
                    }
                }
            }
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching stage manifest for changes: {:?}", path);

        Ok(Self {
            _watcher: watcher,
            event_rx,
            path,
            seen,
        })
    }

    /// Manifest being watched
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw filesystem events seen in the manifest directory
    pub fn events_seen(&self) -> u64 {
        *self.seen.lock()
    }

    /// Drain pending events, keeping only the most recent one.
    ///
    /// A burst of saves collapses into a single reload.
    pub fn poll(&self) -> Option<ManifestEvent> {
        self.event_rx.try_iter().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_starts_on_existing_directory() {
        let dir = std::env::temp_dir();
        let watcher = ManifestWatcher::new(dir.join("lumen_watch_test.ron"), MANIFEST_DEBOUNCE).unwrap();
        assert_eq!(watcher.path().file_name().unwrap(), "lumen_watch_test.ron");
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn test_watcher_fails_on_missing_directory() {
        let result = ManifestWatcher::new("/nonexistent/lumen/stage.ron", MANIFEST_DEBOUNCE);
        assert!(result.is_err());
    }
}
