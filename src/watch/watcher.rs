// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::ingest::EventIngestor;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping the handle (or
/// calling [`shutdown`](Self::shutdown)) unsubscribes from the OS watch,
/// which closes the event channel and lets the ingest task finish.
pub struct WatcherHandle {
    inner: RecommendedWatcher,
    root: PathBuf,
    ingest_task: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching and wait for the ingest task to drain its channel.
    pub async fn shutdown(self) {
        let WatcherHandle {
            mut inner,
            root,
            ingest_task,
        } = self;

        if let Err(err) = inner.unwatch(&root) {
            debug!(error = %err, "unwatch failed during shutdown");
        }
        drop(inner);

        if let Err(err) = ingest_task.await {
            warn!(error = %err, "ingest task ended abnormally");
        }
        info!("file watcher stopped");
    }
}

/// Start watching `ingestor.root()` recursively.
///
/// The `notify` callback runs on the backend's own thread and only forwards
/// raw events over an unbounded channel. A Tokio task owns the ingestor and
/// turns those events into debouncer records, so filtering never happens on
/// the OS callback thread.
///
/// Failure to create the watcher or to subscribe to the root is returned as
/// [`WatchfixError::WatchStartup`](crate::errors::WatchfixError::WatchStartup).
pub fn spawn_watcher(ingestor: EventIngestor, fs: Arc<dyn FileSystem>) -> Result<WatcherHandle> {
    let root = ingestor.root().to_path_buf();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    warn!("failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                warn!("file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    let ingest_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            let recorded = ingestor.ingest(fs.as_ref(), &event);
            if recorded > 0 {
                debug!(recorded, pending = ingestor.debouncer().pending_len(), "changes recorded");
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        inner: watcher,
        root,
        ingest_task,
    })
}
