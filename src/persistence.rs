use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::Path,
    time::Duration,
};

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::errors::SnapshotError;
use crate::state::kv::{InnerMap, KvStore};

/// Read a snapshot file.
///
/// `Ok(None)` when the file does not exist.
pub fn read_snapshot(path: &Path) -> Result<Option<InnerMap>, SnapshotError> {
    let data = match fs::read(path) {
        Ok(d) => d,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let map: HashMap<String, String> = serde_json::from_slice(&data)?;
    Ok(Some(map))
}

/// Load the snapshot at `path` into `store`.
///
/// A missing file is silent. A broken file is logged and the store keeps
/// whatever it already held. Returns the number of entries loaded.
pub fn hydrate(path: &Path, store: &KvStore) -> usize {
    match read_snapshot(path) {
        Ok(Some(entries)) => {
            let loaded = entries.len();
            store.extend(entries);
            tracing::info!("Loaded snapshot: {} entries from {}", loaded, path.display());
            loaded
        }
        Ok(None) => {
            tracing::info!("No snapshot found at startup (path = {})", path.display());
            0
        }
        Err(e) => {
            tracing::warn!("Failed to load snapshot {}: {e}", path.display());
            0
        }
    }
}

/// Build a store from `initial` and hydrate it from `path`.
pub fn open_store(initial: InnerMap, path: &Path) -> KvStore {
    let store = KvStore::with_entries(initial);
    hydrate(path, &store);
    store
}

/// Save the current KV state to `path`.
///
/// The map is copied under the lock; the file write happens after the lock
/// is released. The content goes to a temp file in the same directory that
/// is then renamed over `path`. Returns the number of entries written.
pub fn save_snapshot(path: &Path, store: &KvStore) -> Result<usize, SnapshotError> {
    let entries = store.to_sorted();
    let json = serde_json::to_vec_pretty(&entries)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    Ok(entries.len())
}

/// Handle to the background autosave task.
pub struct SnapshotTask {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SnapshotTask {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Wait for the loop to exit. Call [`SnapshotTask::shutdown`] first.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!("Snapshot task ended abnormally: {e}");
        }
    }
}

/// Run one [`save_snapshot`] on the blocking pool and log the outcome.
///
/// Failures are logged only; the next tick is the retry.
async fn save_in_background(path: &Path, store: &KvStore) {
    let target = path.to_path_buf();
    let store = store.clone();

    match tokio::task::spawn_blocking(move || save_snapshot(&target, &store)).await {
        Ok(Ok(n)) => tracing::info!("Snapshot saved: {} entries", n),
        Ok(Err(e)) => tracing::warn!("Failed to save snapshot {}: {e}", path.display()),
        Err(e) => tracing::warn!("Snapshot write aborted: {e}"),
    }
}

/// Spawn the loop that saves a snapshot every `every` until `token` fires.
///
/// The first save happens one full interval after start.
pub fn spawn_autosave(
    path: impl AsRef<Path>,
    store: KvStore,
    every: Duration,
    token: CancellationToken,
) -> SnapshotTask {
    let path = path.as_ref().to_path_buf();
    let loop_token = token.clone();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = loop_token.cancelled() => break,
                _ = ticker.tick() => save_in_background(&path, &store).await,
            }
        }

        tracing::debug!("Snapshot loop stopped");
    });

    SnapshotTask { token, task }
}
