//! Subscriber store for chat registrations.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doublexp_models::SubscriberId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::atomic::{read_json_if_exists, write_json_atomic};
use crate::error::{PersistenceError, Result};

/// File name of the subscriber relation inside the data directory.
pub const SUBSCRIBERS_FILE: &str = "subscribers.json";

/// Result of adding a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The id was not known and has been stored.
    Added,
    /// The id was already stored; nothing changed.
    AlreadyPresent,
}

/// One stored subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    pub chat_id: SubscriberId,
    /// Informational only.
    pub created_at: DateTime<Utc>,
}

/// Set of subscriber ids.
///
/// Every operation is idempotent: adding a known id and removing an unknown
/// id both succeed without changing the store. Each call is atomic with
/// respect to the others, so concurrent handlers need no extra locking.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Adds a subscriber.
    async fn add(&self, id: SubscriberId) -> Result<AddOutcome>;

    /// Removes a subscriber. Returns whether the id was present.
    async fn remove(&self, id: SubscriberId) -> Result<bool>;

    /// Returns every stored subscriber id.
    async fn list_all(&self) -> Result<BTreeSet<SubscriberId>>;

    /// Returns true if the id is stored.
    async fn contains(&self, id: SubscriberId) -> Result<bool> {
        Ok(self.list_all().await?.contains(&id))
    }
}

type SubscriberMap = BTreeMap<SubscriberId, DateTime<Utc>>;

/// Subscriber store backed by a JSON file.
///
/// ```text
/// data_dir/
/// └── subscribers.json   # [{ "chat_id": 123, "created_at": "..." }, ...]
/// ```
///
/// The file is loaded once on open and rewritten atomically after every
/// change. Writes run on the blocking pool while the async lock is held, so
/// mutations stay serialized without stalling the runtime. A failed write
/// leaves the in-memory set unchanged.
pub struct JsonSubscriberStore {
    path: PathBuf,
    subscribers: tokio::sync::Mutex<SubscriberMap>,
}

impl JsonSubscriberStore {
    /// Opens (or starts) the store in `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = data_dir.as_ref().join(SUBSCRIBERS_FILE);
        let records: Vec<SubscriberRecord> = read_json_if_exists(&path)?.unwrap_or_default();

        let subscribers: SubscriberMap = records
            .into_iter()
            .map(|r| (r.chat_id, r.created_at))
            .collect();
        info!(count = subscribers.len(), path = %path.display(), "Loaded subscribers");

        Ok(Self {
            path,
            subscribers: tokio::sync::Mutex::new(subscribers),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, subscribers: &SubscriberMap) -> Result<()> {
        let path = self.path.clone();
        let records = to_records(subscribers);
        let count = records.len();

        tokio::task::spawn_blocking(move || write_json_atomic(&path, &records))
            .await
            .map_err(|e| PersistenceError::TaskFailed(e.to_string()))??;

        debug!(count, path = %self.path.display(), "Saved subscribers");
        Ok(())
    }
}

fn to_records(subscribers: &SubscriberMap) -> Vec<SubscriberRecord> {
    subscribers
        .iter()
        .map(|(&chat_id, &created_at)| SubscriberRecord {
            chat_id,
            created_at,
        })
        .collect()
}

#[async_trait]
impl SubscriberStore for JsonSubscriberStore {
    async fn add(&self, id: SubscriberId) -> Result<AddOutcome> {
        let mut subscribers = self.subscribers.lock().await;
        if subscribers.contains_key(&id) {
            return Ok(AddOutcome::AlreadyPresent);
        }

        let mut next = subscribers.clone();
        next.insert(id, Utc::now());
        self.save(&next).await?;
        *subscribers = next;
        Ok(AddOutcome::Added)
    }

    async fn remove(&self, id: SubscriberId) -> Result<bool> {
        let mut subscribers = self.subscribers.lock().await;
        if !subscribers.contains_key(&id) {
            return Ok(false);
        }

        let mut next = subscribers.clone();
        next.remove(&id);
        self.save(&next).await?;
        *subscribers = next;
        Ok(true)
    }

    async fn list_all(&self) -> Result<BTreeSet<SubscriberId>> {
        Ok(self.subscribers.lock().await.keys().copied().collect())
    }

    async fn contains(&self, id: SubscriberId) -> Result<bool> {
        Ok(self.subscribers.lock().await.contains_key(&id))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| PersistenceError::LockPoisoned(e.to_string()))
}

/// In-memory subscriber store, for tests and dry runs.
#[derive(Default)]
pub struct MemorySubscriberStore {
    subscribers: Mutex<BTreeSet<SubscriberId>>,
}

impl MemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `ids`.
    pub fn with_subscribers(ids: impl IntoIterator<Item = SubscriberId>) -> Self {
        Self {
            subscribers: Mutex::new(ids.into_iter().collect()),
        }
    }
}

#[async_trait]
impl SubscriberStore for MemorySubscriberStore {
    async fn add(&self, id: SubscriberId) -> Result<AddOutcome> {
        if lock(&self.subscribers)?.insert(id) {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::AlreadyPresent)
        }
    }

    async fn remove(&self, id: SubscriberId) -> Result<bool> {
        Ok(lock(&self.subscribers)?.remove(&id))
    }

    async fn list_all(&self) -> Result<BTreeSet<SubscriberId>> {
        Ok(lock(&self.subscribers)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = JsonSubscriberStore::open(dir.path()).unwrap();

        assert_eq!(store.add(SubscriberId(42)).await.unwrap(), AddOutcome::Added);
        assert_eq!(store.add(SubscriberId(42)).await.unwrap(), AddOutcome::AlreadyPresent);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains(&SubscriberId(42)));
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let dir = tempdir().unwrap();
        let store = JsonSubscriberStore::open(dir.path()).unwrap();
        store.add(SubscriberId(1)).await.unwrap();

        assert!(!store.remove(SubscriberId(2)).await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        assert!(store.remove(SubscriberId(1)).await.unwrap());
        assert!(!store.remove(SubscriberId(1)).await.unwrap());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = JsonSubscriberStore::open(dir.path()).unwrap();
            store.add(SubscriberId(-1001)).await.unwrap();
            store.add(SubscriberId(7)).await.unwrap();
            store.remove(SubscriberId(7)).await.unwrap();
        }

        let reopened = JsonSubscriberStore::open(dir.path()).unwrap();
        let all = reopened.list_all().await.unwrap();
        assert_eq!(all.into_iter().collect::<Vec<_>>(), vec![SubscriberId(-1001)]);
        assert!(reopened.contains(SubscriberId(-1001)).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_keeps_creation_time() {
        let dir = tempdir().unwrap();
        let store = JsonSubscriberStore::open(dir.path()).unwrap();
        let before = Utc::now();
        store.add(SubscriberId(5)).await.unwrap();

        let read = || -> Vec<SubscriberRecord> {
            read_json_if_exists(store.path()).unwrap().unwrap()
        };
        let first = read()[0].created_at;

        // Re-adding does not refresh the timestamp
        store.add(SubscriberId(5)).await.unwrap();
        assert_eq!(read()[0].created_at, first);
        assert_eq!(read()[0].chat_id, SubscriberId(5));
        assert!(first >= before);
    }

    #[tokio::test]
    async fn test_open_missing_dir_starts_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSubscriberStore::open(dir.path().join("not/yet/created")).unwrap();
        assert!(store.list_all().await.unwrap().is_empty());

        // First write creates the directory
        store.add(SubscriberId(3)).await.unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_open_corrupt_file_fails() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SUBSCRIBERS_FILE), "[{\"chat_id\":").unwrap();

        assert!(matches!(
            JsonSubscriberStore::open(dir.path()),
            Err(PersistenceError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_set_unchanged() {
        let dir = tempdir().unwrap();
        // A regular file where the data directory should be makes every write fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = JsonSubscriberStore::open(&blocker).unwrap();

        assert!(store.add(SubscriberId(9)).await.is_err());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_all_persisted() {
        let dir = tempdir().unwrap();
        let store = Arc::new(JsonSubscriberStore::open(dir.path()).unwrap());

        let handles: Vec<_> = (0..16)
            .map(|id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add(SubscriberId(id)).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), AddOutcome::Added);
        }

        let reopened = JsonSubscriberStore::open(dir.path()).unwrap();
        assert_eq!(reopened.list_all().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySubscriberStore::with_subscribers([SubscriberId(1)]);
        assert_eq!(store.add(SubscriberId(1)).await.unwrap(), AddOutcome::AlreadyPresent);
        assert_eq!(store.add(SubscriberId(2)).await.unwrap(), AddOutcome::Added);
        assert!(store.contains(SubscriberId(2)).await.unwrap());
        assert!(store.remove(SubscriberId(1)).await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}
