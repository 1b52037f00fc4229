use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::recovery::RECOVERY_LOG_NAME;

/// Events sent from the file watcher to the front end.
#[derive(Debug)]
pub enum FileEvent {
    /// One or more checklist files changed on disk.
    Changed(Vec<PathBuf>),
}

/// A file system watcher for the storage folder.
pub struct FolderWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

/// Whether a changed path is a checklist file inside `folder`
fn is_relevant(folder: &Path, path: &Path) -> bool {
    if path.parent() != Some(folder) {
        return false;
    }
    if path.file_name().and_then(|n| n.to_str()) == Some(RECOVERY_LOG_NAME) {
        return false;
    }
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

impl FolderWatcher {
    /// Start watching the given storage folder (non-recursively).
    pub fn start(folder: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let folder_owned = folder.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::debug!("watch error: {}", e);
                        return;
                    }
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                let relevant: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| is_relevant(&folder_owned, p))
                    .collect();

                if !relevant.is_empty() {
                    let _ = tx.send(FileEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(folder, RecursiveMode::NonRecursive)?;
        Ok(FolderWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending file events.
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// Block until at least one event arrives, then drain the rest.
    /// Returns an empty vector if the watcher shut down.
    pub fn wait(&self) -> Vec<FileEvent> {
        let mut events = match self.rx.recv() {
            Ok(evt) => vec![evt],
            Err(_) => return Vec::new(),
        };
        events.extend(self.poll());
        events
    }
}
