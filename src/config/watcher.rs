//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::FrontConfig;

/// Watches the configuration file and publishes every valid new version.
///
/// Invalid edits are logged and dropped; the running controller keeps
/// serving with the last good configuration.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<FrontConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<FrontConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Dropping the returned handle stops the watcher.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let ConfigWatcher { path, update_tx } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event.kind) => reload(&path, &update_tx),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %watched.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    kind.is_modify() || kind.is_create()
}

fn reload(path: &Path, update_tx: &mpsc::UnboundedSender<FrontConfig>) {
    tracing::info!(path = %path.display(), "Config change detected, reloading");
    match load_config(path) {
        Ok(config) => {
            if update_tx.send(config).is_err() {
                tracing::debug!("Config receiver dropped; ignoring update");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config; keeping current configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[test]
    fn test_relevant_events() {
        assert!(is_relevant(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_relevant(&EventKind::Create(CreateKind::File)));
        assert!(!is_relevant(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn test_reload_sends_valid_config() {
        let path = std::env::temp_dir().join(format!("front-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "actions = [\"StatusAction\"]").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        reload(&path, &tx);
        std::fs::write(&path, "actions = [").unwrap();
        reload(&path, &tx);
        std::fs::remove_file(&path).unwrap();

        let config = rx.try_recv().unwrap();
        assert_eq!(config.actions, vec!["StatusAction"]);
        assert!(rx.try_recv().is_err());
    }
}
