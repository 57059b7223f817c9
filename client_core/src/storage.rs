//! Persistence boundary for everything this client keeps across restarts:
//! the keychain, the subscription store's settled/pending tables, and the
//! JSON-RPC history. A `DashMap`-backed in-memory implementation is provided
//! behind the same trait so a file or database-backed implementation can be
//! swapped in without touching the rest of the client.

use {
    serde::{de::DeserializeOwned, Serialize},
    std::{collections::HashMap, sync::Arc, sync::RwLock},
};

/// Errors a [`KeyValueStorage`] implementation can surface.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A namespaced key-value store, keyed the way spec §6 lays out persisted
/// state: `wc@2:client//<subsystem>:<table>`.
///
/// Implementations only need to persist opaque JSON blobs; (de)serialization
/// of the concrete value types happens at the call site via the provided
/// default methods.
pub trait KeyValueStorage: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn delete_raw(&self, key: &str) -> Result<(), StorageError>;
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        Self: Sized,
    {
        self.get_raw(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(StorageError::from))
            .transpose()
    }

    fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError>
    where
        Self: Sized,
    {
        self.set_raw(key, serde_json::to_string(value)?)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.delete_raw(key)
    }
}

/// Forwards through an `Arc`, so `Arc<dyn KeyValueStorage>` (what the engine
/// and subscription store hold) can itself be used anywhere a
/// `KeyValueStorage` is expected — including as the concrete `S` for
/// [`crate::crypto::Crypto`] and [`crate::history::History`], which need
/// `Self: Sized` for their generic `get`/`set` helpers.
impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set_raw(key, value)
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete_raw(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        (**self).keys_with_prefix(prefix)
    }
}

/// Reference in-memory [`KeyValueStorage`], used by the client when no
/// persistence is configured, and by tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| StorageError::Backend("lock poisoned".into()))?
            .get(key)
            .cloned())
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".into()))?
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn delete_raw(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".into()))?
            .remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| StorageError::Backend("lock poisoned".into()))?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values() {
        let storage = MemoryStorage::new();
        storage.set("wc@2:client//keychain:a", &42u32).unwrap();
        assert_eq!(
            storage.get::<u32>("wc@2:client//keychain:a").unwrap(),
            Some(42)
        );

        storage.delete("wc@2:client//keychain:a").unwrap();
        assert_eq!(storage.get::<u32>("wc@2:client//keychain:a").unwrap(), None);
    }

    #[test]
    fn lists_by_prefix() {
        let storage = MemoryStorage::new();
        storage.set("wc@2:client//pending:1", &1u32).unwrap();
        storage.set("wc@2:client//settled:1", &1u32).unwrap();

        let keys = storage.keys_with_prefix("wc@2:client//pending:").unwrap();
        assert_eq!(keys, vec!["wc@2:client//pending:1".to_string()]);
    }
}
