//! Configuration hot-reload on file change.
//!
//! The parent directory is watched rather than the file itself: deployment
//! tools replace the file by rename, which would silently detach a watch on
//! the old inode. Events are filtered down to the configuration file name,
//! and a reload only happens when the file content actually differs from
//! the last successfully loaded one, so rewrite bursts and no-op touches
//! stay cheap.

use std::ffi::OsString;
use std::path::PathBuf;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::Wallet;

/// Handle for the background reload task.
pub struct ConfigWatcher {
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Stop watching. The wallet keeps the configuration it last loaded.
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Spawn a background task that re-reads the access policy whenever the
/// configuration file changes on disk.
pub fn watch_config(wallet: Wallet, config_path: PathBuf) -> ConfigWatcher {
    ConfigWatcher {
        task: tokio::spawn(run(wallet, config_path)),
    }
}

async fn run(wallet: Wallet, config_path: PathBuf) {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let file_name: Option<OsString> = config_path.file_name().map(|n| n.to_os_string());

    let mut watcher = match RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("configuration watch error: {e}");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            // The directory watch reports every neighbour; only events
            // touching the configuration file itself matter.
            let touches_config = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if touches_config {
                let _ = tx.send(());
            }
        },
        notify::Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::error!("failed to create configuration watcher: {e}");
            return;
        }
    };

    let watch_dir = config_path.parent().unwrap_or(&config_path);
    if let Err(e) = watcher.watch(watch_dir, RecursiveMode::NonRecursive) {
        tracing::error!("failed to watch configuration directory: {e}");
        return;
    }

    tracing::info!(
        "watching configuration file for changes: {}",
        config_path.display()
    );

    let mut last_loaded = tokio::fs::read_to_string(&config_path).await.ok();

    while rx.recv().await.is_some() {
        let contents = match tokio::fs::read_to_string(&config_path).await {
            Ok(contents) => contents,
            // Mid-rewrite the file can be briefly absent; the rename that
            // completes the rewrite delivers another event.
            Err(_) => continue,
        };
        if Some(&contents) == last_loaded.as_ref() {
            continue;
        }

        match wallet.reload_config().await {
            Ok(()) => {
                last_loaded = Some(contents);
                tracing::info!("configuration reloaded from disk");
            }
            Err(e) => {
                tracing::warn!("configuration reload failed, keeping previous: {e}");
            }
        }
    }
}
