//! Config file watching for hot reload.
//!
//! The parent directory is watched rather than the file, so a config replaced
//! by rename (editors, deploy tools writing a temp file first) keeps being
//! picked up. Events for other files in the directory are ignored.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RelayConfig;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("config path {0:?} does not name a file")]
    NotAFile(PathBuf),

    #[error("cannot watch config directory: {0}")]
    Notify(#[from] notify::Error),
}

/// Sends a freshly validated `RelayConfig` every time the watched file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    dir: PathBuf,
    file_name: OsString,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> Result<Self, WatchError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| WatchError::NotAFile(path.to_path_buf()))?
            .to_os_string();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            path: path.to_path_buf(),
            dir,
            file_name,
        })
    }

    fn concerns_config(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    /// Start watching. Dropping the returned watcher stops updates.
    pub fn spawn(
        self,
    ) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<RelayConfig>), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dir = self.dir.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !self.concerns_config(&event) {
                    return;
                }

                match load_config(&self.path) {
                    Ok(config) => {
                        tracing::info!(path = ?self.path, "Config file changed");
                        if tx.send(config).is_err() {
                            tracing::debug!("Config receiver gone, dropping update");
                        }
                    }
                    // A rename-in-place can surface before the new file is complete.
                    Err(e) => {
                        tracing::warn!(path = ?self.path, error = %e, "Config reload failed, keeping current settings");
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = ?dir, "Watching config directory");

        Ok((watcher, rx))
    }
}
