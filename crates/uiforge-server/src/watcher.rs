//! File watching for live preview.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Quiet period before a burst of events is delivered.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    /// File was created or written
    Changed(PathBuf),

    /// File was deleted
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Changed(path) | Self::Removed(path) => path,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch the given files and directories.
    ///
    /// Files are watched through their parent directory so editors that save
    /// by rename are still seen; only events for the file itself are
    /// delivered. Events are debounced and deduplicated per path.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        let mut targets = Vec::with_capacity(paths.len());

        for path in paths {
            let target = absolute(path)?;

            if target.is_dir() {
                watcher
                    .watch(&target, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else if let Some(parent) = target.parent().filter(|p| p.exists()) {
                watcher
                    .watch(parent, RecursiveMode::NonRecursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::warn!("Not watching {}: directory does not exist", path.display());
                continue;
            }

            targets.push(target);
        }

        std::thread::spawn(move || {
            let mut pending: Vec<WatchEvent> = Vec::new();

            loop {
                let next = if pending.is_empty() {
                    sync_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
                } else {
                    sync_rx.recv_timeout(DEBOUNCE)
                };

                match next {
                    Ok(event) => {
                        for path in &event.paths {
                            if !targets.iter().any(|t| path.starts_with(t)) {
                                continue;
                            }
                            if let Some(e) = classify_event(path, &event.kind) {
                                if !pending.contains(&e) {
                                    pending.push(e);
                                }
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        let mut seen = HashSet::new();
                        // Latest event per path wins
                        let batch: Vec<_> = pending
                            .drain(..)
                            .rev()
                            .filter(|e| seen.insert(e.path().to_path_buf()))
                            .collect();

                        for e in batch.into_iter().rev() {
                            if async_tx.blocking_send(e).is_err() {
                                return;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Absolute form of `path`, resolving symlinks where the path exists.
fn absolute(path: &Path) -> Result<PathBuf, std::io::Error> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }

    let path = std::path::absolute(path)?;
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(path),
        },
        _ => Ok(path),
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    match kind {
        EventKind::Create(_) | EventKind::Modify(_) => {
            if path.exists() {
                Some(WatchEvent::Changed(path.to_path_buf()))
            } else {
                Some(WatchEvent::Removed(path.to_path_buf()))
            }
        }
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        _ => None,
    }
}
