use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Watches the config file and sends a notification whenever it is written
/// or replaced.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by renaming a temporary file over the original are still seen.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// let (_watcher, mut rx) = ups_config::ConfigWatcher::spawn("/etc/upsmon/upsmon.toml");
/// while rx.recv().await.is_some() {
///     println!("config changed; reloading");
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`.
    /// Returns the watcher handle and a receiver that fires on every detected change.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<()>) {
    use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = event_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", dir.display());
        return;
    }

    info!("Watching config file: {}", path.display());

    while let Some(event) = event_rx.recv().await {
        match event {
            Ok(e) => {
                if !matches!(e.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    continue;
                }
                if !touches(&e.paths, &path) {
                    continue;
                }
                debug!(kind = ?e.kind, "config file changed");
                // A pending notification already covers this change.
                if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(()) {
                    break;
                }
            }
            Err(e) => warn!("Watcher error: {e}"),
        }
    }
}

fn touches(paths: &[PathBuf], target: &Path) -> bool {
    let name = target.file_name();
    paths
        .iter()
        .any(|p| p == target || (name.is_some() && p.file_name() == name))
}
