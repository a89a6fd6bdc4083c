//! The persisted store container shared by every domain store.
//!
//! A `PersistedStore<S>` keeps its state in a `tokio::sync::watch` channel:
//! mutations run synchronously under the channel's lock, readers always see
//! the latest value, and subscribers are woken on every change. After each
//! mutation a snapshot is handed to a background writer task which coalesces
//! pending snapshots and writes only the newest one.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::storage::Storage;

/// State that is persisted under its own storage key.
pub trait StoreState:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    /// Storage key, unique per store.
    const KEY: &'static str;

    /// Bumped when a snapshot can no longer be read as the current shape.
    const VERSION: u32 = 1;
}

#[derive(Serialize)]
struct SnapshotRef<'a, S> {
    version: u32,
    state: &'a S,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    state: serde_json::Value,
}

enum WriteCommand<S> {
    Write(S),
    Flush(oneshot::Sender<()>),
}

struct Inner<S> {
    state: watch::Sender<S>,
    writer: Option<mpsc::UnboundedSender<WriteCommand<S>>>,
}

/// Cloneable handle to one store's state.
pub struct PersistedStore<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for PersistedStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for PersistedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("persisted", &self.inner.writer.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: StoreState> PersistedStore<S> {
    /// Load the snapshot under `S::KEY` and start the writer task.
    ///
    /// A missing, unreadable or incompatible snapshot yields `S::default()`.
    /// Must be called from within a Tokio runtime.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let initial = load_snapshot::<S>(storage.as_ref());
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer::<S>(storage, rx));
        Self {
            inner: Arc::new(Inner {
                state: watch::Sender::new(initial),
                writer: Some(tx),
            }),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> PersistedStore<S> {
    /// A store that lives only in memory.
    pub fn in_memory(initial: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: watch::Sender::new(initial),
                writer: None,
            }),
        }
    }

    /// Clone of the current state.
    pub fn get(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// Read part of the state without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Mutate the state, notify subscribers and schedule a write.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut result = None;
        self.inner.state.send_modify(|state| {
            result = Some(f(state));
            self.persist(state);
        });
        match result {
            Some(result) => result,
            None => unreachable!("send_modify always runs the closure"),
        }
    }

    /// Like [`PersistedStore::update`], but `f` reports whether it changed
    /// anything. On `false` subscribers are not woken and nothing is written,
    /// so `f` must leave the state untouched when it returns `false`.
    pub fn update_if(&self, f: impl FnOnce(&mut S) -> bool) -> bool {
        self.inner.state.send_if_modified(|state| {
            let changed = f(state);
            if changed {
                self.persist(state);
            }
            changed
        })
    }

    /// Replace the whole state.
    pub fn replace(&self, state: S) {
        self.update(|current| *current = state);
    }

    /// Watch for changes.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.inner.state.subscribe()
    }

    /// Wait until every snapshot taken before this call reached storage.
    pub async fn flush(&self) {
        let Some(writer) = &self.inner.writer else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        if writer.send(WriteCommand::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Queue a snapshot. Called under the channel lock so snapshots reach
    /// the writer in mutation order.
    fn persist(&self, state: &S) {
        if let Some(writer) = &self.inner.writer
            && writer.send(WriteCommand::Write(state.clone())).is_err()
        {
            warn!("store writer stopped; snapshot not persisted");
        }
    }
}

fn load_snapshot<S: StoreState>(storage: &dyn Storage) -> S {
    let raw = match storage.read(S::KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = S::KEY, "no snapshot, starting from defaults");
            return S::default();
        }
        Err(e) => {
            warn!(key = S::KEY, error = %e, "failed to read snapshot, starting from defaults");
            return S::default();
        }
    };

    let snapshot = match serde_json::from_str::<Snapshot>(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(key = S::KEY, error = %e, "corrupt snapshot, starting from defaults");
            return S::default();
        }
    };

    if snapshot.version != S::VERSION {
        info!(
            key = S::KEY,
            found = snapshot.version,
            expected = S::VERSION,
            "snapshot version changed, starting from defaults"
        );
        return S::default();
    }

    serde_json::from_value(snapshot.state).unwrap_or_else(|e| {
        warn!(key = S::KEY, error = %e, "snapshot does not match state shape, starting from defaults");
        S::default()
    })
}

async fn run_writer<S: StoreState>(
    storage: Arc<dyn Storage>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand<S>>,
) {
    while let Some(command) = rx.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();
        let mut next = Some(command);

        while let Some(command) = next {
            match command {
                WriteCommand::Write(state) => latest = Some(state),
                WriteCommand::Flush(waiter) => waiters.push(waiter),
            }
            next = rx.try_recv().ok();
        }

        if let Some(state) = latest {
            write_snapshot(&storage, &state).await;
        }
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }
    debug!(key = S::KEY, "store writer stopped");
}

async fn write_snapshot<S: StoreState>(storage: &Arc<dyn Storage>, state: &S) {
    let json = match serde_json::to_string(&SnapshotRef {
        version: S::VERSION,
        state,
    }) {
        Ok(json) => json,
        Err(e) => {
            warn!(key = S::KEY, error = %e, "failed to serialize snapshot");
            return;
        }
    };

    let storage = Arc::clone(storage);
    match tokio::task::spawn_blocking(move || storage.write(S::KEY, &json)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(key = S::KEY, error = %e, "failed to write snapshot"),
        Err(e) => warn!(key = S::KEY, error = %e, "snapshot write task failed"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Counter {
        value: u32,
        label: String,
    }

    impl StoreState for Counter {
        const KEY: &'static str = "counter-storage";
        const VERSION: u32 = 2;
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk on fire")))
        }
        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk on fire")))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_update_is_visible_and_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let store = PersistedStore::<Counter>::open(storage.clone());

        let returned = store.update(|s| {
            s.value += 3;
            s.value
        });
        assert_eq!(returned, 3);
        assert_eq!(store.get().value, 3);

        store.flush().await;
        let raw = storage.read("counter-storage").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], 2);
        assert_eq!(json["state"]["value"], 3);
    }

    #[tokio::test]
    async fn test_reopen_restores_state() {
        let storage = Arc::new(MemoryStorage::new());
        let store = PersistedStore::<Counter>::open(storage.clone());
        store.update(|s| s.label = "night one".to_owned());
        store.flush().await;

        let reopened = PersistedStore::<Counter>::open(storage);
        assert_eq!(reopened.get().label, "night one");
    }

    #[tokio::test]
    async fn test_bad_snapshots_fall_back_to_default() {
        for raw in [
            "not json",
            r#"{"version":1,"state":{"value":9}}"#,
            r#"{"version":2,"state":{"value":"nine"}}"#,
        ] {
            let storage = Arc::new(MemoryStorage::new());
            storage.write("counter-storage", raw).unwrap();
            let store = PersistedStore::<Counter>::open(storage);
            assert_eq!(store.get(), Counter::default(), "input: {raw}");
        }
    }

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write("counter-storage", r#"{"version":2,"state":{"value":4}}"#)
            .unwrap();
        let store = PersistedStore::<Counter>::open(storage);
        assert_eq!(store.get().value, 4);
        assert_eq!(store.get().label, "");
    }

    #[tokio::test]
    async fn test_storage_failures_never_surface() {
        let store = PersistedStore::<Counter>::open(Arc::new(BrokenStorage));
        assert_eq!(store.get(), Counter::default());
        store.update(|s| s.value = 1);
        store.flush().await;
        assert_eq!(store.get().value, 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = PersistedStore::in_memory(Counter::default());
        let mut rx = store.subscribe();
        store.update(|s| s.value = 7);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().value, 7);
        store.flush().await;
    }

    #[tokio::test]
    async fn test_update_if_skips_unchanged() {
        let storage = Arc::new(MemoryStorage::new());
        let store = PersistedStore::<Counter>::open(storage.clone());
        let mut rx = store.subscribe();

        assert!(!store.update_if(|_| false));
        store.flush().await;
        assert!(!rx.has_changed().unwrap());
        assert!(storage.read("counter-storage").unwrap().is_none());

        assert!(store.update_if(|s| {
            s.value = 5;
            true
        }));
        store.flush().await;
        assert!(rx.has_changed().unwrap());
        assert!(storage.read("counter-storage").unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_persist_latest() {
        let storage = Arc::new(MemoryStorage::new());
        let store = PersistedStore::<Counter>::open(storage.clone());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    for _ in 0..250 {
                        store.update(|s| s.value += 1);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        store.flush().await;

        let reopened = PersistedStore::<Counter>::open(storage);
        assert_eq!(reopened.get().value, 2000);
    }

    #[tokio::test]
    async fn test_many_updates_coalesce_to_latest() {
        let storage = Arc::new(MemoryStorage::new());
        let store = PersistedStore::<Counter>::open(storage.clone());
        for _ in 0..100 {
            store.update(|s| s.value += 1);
        }
        store.flush().await;
        let reopened = PersistedStore::<Counter>::open(storage);
        assert_eq!(reopened.get().value, 100);
    }
}
