//! Subscription Store: a generic, TTL-backed table of sequences (pairings or
//! sessions), persisted through [`KeyValueStorage`] and restored on startup,
//! with expiry enforcement and a cache/restore handshake so a client can
//! survive restarts with whatever sequences were settled before it last shut
//! down.

use {
    crate::storage::{KeyValueStorage, StorageError},
    serde::{de::DeserializeOwned, Serialize},
    std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, RwLock,
        },
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
    tokio::sync::broadcast,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An event emitted by a [`Store`] as entries are created, mutated, expired
/// or explicitly deleted.
#[derive(Debug, Clone)]
pub enum StoreEvent<T> {
    /// The restore/enable handshake completed: entries loaded from storage
    /// are now live and their expiry timers are running.
    Enabled,
    Created { topic: String, value: T },
    Updated { topic: String, value: T },
    Deleted { topic: String, value: T, expired: bool },
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A namespaced, TTL-backed table of entries of type `T`, keyed by topic.
///
/// On [`Store::init`], entries are loaded from storage into a cache while
/// disabled (read access is still correct, since the cache is populated
/// before anything else touches it); once every entry's expiry timer has
/// been rehydrated the store flips to enabled and emits
/// [`StoreEvent::Enabled`]. A 5-second heartbeat re-walks the table and
/// expires anything past its TTL, independent of per-entry timers, so a
/// paused process (e.g. a suspended mobile app) still converges once it
/// resumes.
pub struct Store<T> {
    prefix: String,
    storage: Arc<dyn KeyValueStorage>,
    entries: RwLock<HashMap<String, (u64, T)>>,
    events: broadcast::Sender<StoreEvent<T>>,
    enabled: AtomicBool,
}

impl<T> Store<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(prefix: impl Into<String>, storage: Arc<dyn KeyValueStorage>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            prefix: prefix.into(),
            storage,
            entries: RwLock::new(HashMap::new()),
            events,
            enabled: AtomicBool::new(false),
        })
    }

    fn key(&self, topic: &str) -> String {
        format!("{}:{topic}", self.prefix)
    }

    /// Loads persisted entries into the cache, then enables the store and
    /// starts the expiry heartbeat. Must be called once before the store is
    /// used; calling it twice is harmless but re-triggers the handshake.
    pub async fn init(self: &Arc<Self>) -> Result<(), StoreError> {
        let prefix = format!("{}:", self.prefix);
        let keys = self.storage.keys_with_prefix(&prefix)?;

        {
            let mut entries = self.entries.write().expect("lock poisoned");
            for key in keys {
                if let Some(raw) = self.storage.get_raw(&key)? {
                    let (expiry, value): (u64, T) =
                        serde_json::from_str(&raw).map_err(StorageError::from)?;
                    let topic = key[prefix.len()..].to_owned();
                    entries.insert(topic, (expiry, value));
                }
            }
        }

        self.enabled.store(true, Ordering::SeqCst);
        let _ = self.events.send(StoreEvent::Enabled);

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(5));
            loop {
                ticker.tick().await;
                this.expire_due();
            }
        });

        Ok(())
    }

    fn expire_due(&self) {
        let now = now_secs();
        let expired: Vec<(String, T)> = {
            let entries = self.entries.read().expect("lock poisoned");
            entries
                .iter()
                .filter(|(_, (expiry, _))| *expiry <= now)
                .map(|(topic, (_, value))| (topic.clone(), value.clone()))
                .collect()
        };

        for (topic, _) in expired {
            if let Ok(Some(value)) = self.remove_entry(&topic) {
                let _ = self.events.send(StoreEvent::Deleted {
                    topic,
                    value,
                    expired: true,
                });
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set(&self, topic: impl Into<String>, value: T, expiry: u64) -> Result<(), StoreError> {
        let topic = topic.into();
        let raw = serde_json::to_string(&(expiry, value.clone())).map_err(StorageError::from)?;
        self.storage.set_raw(&self.key(&topic), raw)?;

        let created = {
            let mut entries = self.entries.write().expect("lock poisoned");
            let created = !entries.contains_key(&topic);
            entries.insert(topic.clone(), (expiry, value.clone()));
            created
        };

        let _ = self.events.send(if created {
            StoreEvent::Created { topic, value }
        } else {
            StoreEvent::Updated { topic, value }
        });

        Ok(())
    }

    pub fn get(&self, topic: &str) -> Option<T> {
        self.entries
            .read()
            .expect("lock poisoned")
            .get(topic)
            .map(|(_, value)| value.clone())
    }

    pub fn expiry(&self, topic: &str) -> Option<u64> {
        self.entries
            .read()
            .expect("lock poisoned")
            .get(topic)
            .map(|(expiry, _)| *expiry)
    }

    /// Applies `f` to the entry for `topic`, persisting and emitting
    /// [`StoreEvent::Updated`] on success. Returns `None` if no entry exists.
    pub fn update(&self, topic: &str, f: impl FnOnce(&mut T)) -> Result<Option<T>, StoreError> {
        let Some((expiry, mut value)) = self.entries.read().expect("lock poisoned").get(topic).cloned()
        else {
            return Ok(None);
        };

        f(&mut value);
        let raw = serde_json::to_string(&(expiry, value.clone())).map_err(StorageError::from)?;
        self.storage.set_raw(&self.key(topic), raw)?;
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(topic.to_owned(), (expiry, value.clone()));

        let _ = self.events.send(StoreEvent::Updated {
            topic: topic.to_owned(),
            value: value.clone(),
        });

        Ok(Some(value))
    }

    pub fn delete(&self, topic: &str) -> Result<Option<T>, StoreError> {
        let removed = self.remove_entry(topic)?;

        if let Some(value) = &removed {
            let _ = self.events.send(StoreEvent::Deleted {
                topic: topic.to_owned(),
                value: value.clone(),
                expired: false,
            });
        }

        Ok(removed)
    }

    /// Removes `topic` from storage and the in-memory table without emitting
    /// a [`StoreEvent::Deleted`] — callers emit their own, since whether the
    /// removal is an expiry or an explicit delete is only known by the
    /// caller.
    fn remove_entry(&self, topic: &str) -> Result<Option<T>, StoreError> {
        self.storage.delete(&self.key(topic))?;
        Ok(self
            .entries
            .write()
            .expect("lock poisoned")
            .remove(topic)
            .map(|(_, value)| value))
    }

    pub fn length(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn topics(&self) -> Vec<String> {
        self.entries.read().expect("lock poisoned").keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<T> {
        self.entries
            .read()
            .expect("lock poisoned")
            .values()
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent<T>> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn restores_entries_and_enables() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let store = Store::<u32>::new("wc@2:client//test:settled", storage.clone());
        store.set("topic-a", 7, now_secs() + 3600).unwrap();

        let restored = Store::<u32>::new("wc@2:client//test:settled", storage);
        assert!(!restored.is_enabled());
        restored.init().await.unwrap();
        assert!(restored.is_enabled());
        assert_eq!(restored.get("topic-a"), Some(7));
    }

    #[tokio::test]
    async fn expires_past_ttl_entries() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let store = Store::<u32>::new("wc@2:client//test:settled", storage);
        store.init().await.unwrap();
        store.set("topic-a", 1, now_secs().saturating_sub(1)).unwrap();

        let mut events = store.subscribe();
        tokio::time::pause();
        tokio::time::advance(Duration::from_secs(6)).await;
        tokio::time::resume();

        // Give the heartbeat task a chance to run.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get("topic-a"), None);

        let mut saw_expiry = false;
        while let Ok(event) = events.try_recv() {
            if let StoreEvent::Deleted { expired: true, .. } = event {
                saw_expiry = true;
            }
        }
        assert!(saw_expiry);
    }
}
