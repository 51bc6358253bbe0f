//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Detect changes to a group config file
//! - Reload and revalidate the file, keeping the current topology on error
//! - Suppress republishes when the topology descriptor did not change

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GroupConfig;

/// Watches a group config file and pushes each reloaded configuration
/// whose topology differs from the last one pushed. Files that fail to
/// load or validate are logged and skipped.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GroupConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path` and the receiver its reloads arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GroupConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in a background thread.
    ///
    /// The returned handle must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watch_path = path.clone();
        // Editors fire several events per save; the descriptor comparison
        // keeps those from republishing an unchanged topology.
        let mut last_topology: Option<String> = None;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    reload(&path, &update_tx, &mut last_topology);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?watch_path, "Group config watcher started");
        Ok(watcher)
    }
}

fn reload(
    path: &Path,
    tx: &mpsc::UnboundedSender<GroupConfig>,
    last_topology: &mut Option<String>,
) {
    match load_config(path) {
        Ok(config) => {
            if last_topology.as_deref() == Some(config.topology.as_str()) {
                tracing::debug!(path = ?path, "Config changed but topology is unchanged");
                return;
            }
            tracing::info!(
                path = ?path,
                group = %config.group_key,
                "Reloaded group config with new topology"
            );
            *last_topology = Some(config.topology.clone());
            let _ = tx.send(config);
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to reload group config, keeping current topology"
            );
        }
    }
}
