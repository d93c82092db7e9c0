//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: editors that save by
//!   renaming a fresh file over the old one replace its inode
//! - A reload is only sent when the parsed config differs from the last one sent,
//!   which collapses the bursts of events a single save produces
//! - An empty file is a write in progress, not a request to fall back to defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, parse_config, ConfigError};
use crate::config::schema::AppConfig;

/// Watches a configuration file and publishes each changed, valid config.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let dir = watch_dir(&self.path);
        let mut state = ReloadState::new(self.path.clone());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !state.concerns(&event) {
                        return;
                    }
                    if let Some(new_config) = state.reload() {
                        tracing::info!("Config file changed, publishing new configuration");
                        let _ = tx.send(new_config);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Directory holding `path`; `.` for a bare file name.
fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Decides which events trigger a reload and drops reloads that change nothing.
struct ReloadState {
    path: PathBuf,
    last: Option<AppConfig>,
}

impl ReloadState {
    fn new(path: PathBuf) -> Self {
        let last = load_config(&path).ok();
        Self { path, last }
    }

    /// True for create/modify events naming the watched file.
    fn concerns(&self, event: &Event) -> bool {
        if !(event.kind.is_modify() || event.kind.is_create()) {
            return false;
        }
        let Some(name) = self.path.file_name() else {
            return false;
        };
        event.paths.iter().any(|p| p.file_name() == Some(name))
    }

    /// Load the file; `Some` only when it is valid and differs from the last config seen.
    fn reload(&mut self) -> Option<AppConfig> {
        let loaded = std::fs::read_to_string(&self.path)
            .map_err(ConfigError::from)
            .and_then(|content| {
                if content.trim().is_empty() {
                    Ok(None)
                } else {
                    parse_config(&content).map(Some)
                }
            });

        match loaded {
            Ok(None) => None,
            Ok(Some(config)) if self.last.as_ref() == Some(&config) => None,
            Ok(Some(config)) => {
                self.last = Some(config.clone());
                Some(config)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to reload config. Keeping current configuration."
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;

    const INITIAL: &str = "[snapshot]\napplication_path = \"/a/\"\n";
    const UPDATED: &str = "[snapshot]\napplication_path = \"/b/\"\n";

    #[test]
    fn test_watch_dir() {
        assert_eq!(watch_dir(Path::new("config.toml")), PathBuf::from("."));
        assert_eq!(watch_dir(Path::new("/etc/sso/config.toml")), PathBuf::from("/etc/sso"));
    }

    #[test]
    fn test_only_events_for_the_file_count() {
        let state = ReloadState {
            path: PathBuf::from("/etc/sso/config.toml"),
            last: None,
        };

        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/sso/config.toml"));
        let create = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/sso/config.toml"));
        let other = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/sso/other.toml"));
        let remove = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/etc/sso/config.toml"));

        assert!(state.concerns(&modify));
        assert!(state.concerns(&create));
        assert!(!state.concerns(&other));
        assert!(!state.concerns(&remove));
    }

    #[test]
    fn test_unchanged_and_invalid_reloads_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, INITIAL).unwrap();

        let mut state = ReloadState::new(path.clone());
        assert!(state.reload().is_none());

        std::fs::write(&path, UPDATED).unwrap();
        let config = state.reload().unwrap();
        assert_eq!(config.snapshot.application_path, "/b/");
        assert!(state.reload().is_none());

        std::fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();
        assert!(state.reload().is_none());

        std::fs::write(&path, "").unwrap();
        assert!(state.reload().is_none());
        assert_eq!(state.last.as_ref().map(|c| c.snapshot.application_path.as_str()), Some("/b/"));
    }

    #[tokio::test]
    async fn test_publishes_config_replaced_by_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, INITIAL).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _watcher = watcher.run().unwrap();

        let staged = dir.path().join("config.toml.tmp");
        std::fs::write(&staged, UPDATED).unwrap();
        std::fs::rename(&staged, &path).unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .expect("no config published")
            .unwrap();
        assert_eq!(config.snapshot.application_path, "/b/");

        // A later in-place edit is still seen after the inode changed.
        std::fs::write(&path, INITIAL).unwrap();
        let config = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .expect("no config published after rename")
            .unwrap();
        assert_eq!(config.snapshot.application_path, "/a/");
    }
}
