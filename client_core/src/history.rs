//! JSON-RPC History: records every outgoing request until its response
//! arrives, so the response can be matched back to the `topic` and method it
//! belongs to and so an unanswered request can be replayed after a restart.
//! Keyed on the `rpc::Request`/`rpc::Response` envelope types and persisted
//! under the `wc@2:client//jsonrpc:history` key.

use {
    crate::{
        rpc::{RequestParams, ResponseParams},
        storage::{KeyValueStorage, StorageError},
    },
    serde::{Deserialize, Serialize},
    std::{collections::HashMap, sync::RwLock},
};

const HISTORY_PREFIX: &str = "wc@2:client//jsonrpc:history:";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("no pending request with id={0}")]
    NotFound(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub topic: String,
    pub request: RequestParams,
    pub response: Option<ResponseParams>,
}

/// Persisted, in-memory-cached JSON-RPC history.
pub struct History<S> {
    storage: S,
    cache: RwLock<HashMap<u64, HistoryRecord>>,
}

impl<S: KeyValueStorage> History<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn key(id: u64) -> String {
        format!("{HISTORY_PREFIX}{id}")
    }

    /// Records an outgoing request. Called before the request is published,
    /// so a response that races ahead of this call can never be orphaned.
    pub fn record_request(
        &self,
        id: u64,
        topic: impl Into<String>,
        request: RequestParams,
    ) -> Result<(), HistoryError> {
        let record = HistoryRecord {
            topic: topic.into(),
            request,
            response: None,
        };
        self.storage.set(&Self::key(id), &record)?;
        self.cache.write().expect("lock poisoned").insert(id, record);
        Ok(())
    }

    /// Records the response for a previously recorded request and deletes
    /// the entry: once a response is in, the pairing/session engine has what
    /// it needs and the history record has served its purpose.
    pub fn resolve(&self, id: u64, response: ResponseParams) -> Result<HistoryRecord, HistoryError> {
        let mut record = self.get(id)?.ok_or(HistoryError::NotFound(id))?;
        record.response = Some(response);
        self.delete(id)?;
        Ok(record)
    }

    pub fn get(&self, id: u64) -> Result<Option<HistoryRecord>, HistoryError> {
        if let Some(record) = self.cache.read().expect("lock poisoned").get(&id) {
            return Ok(Some(record.clone()));
        }
        Ok(self.storage.get(&Self::key(id))?)
    }

    pub fn delete(&self, id: u64) -> Result<(), HistoryError> {
        self.storage.delete(&Self::key(id))?;
        self.cache.write().expect("lock poisoned").remove(&id);
        Ok(())
    }

    /// Requests that never received a response, e.g. because the process
    /// crashed before one arrived. A client can choose to replay these on
    /// startup or surface them as timed out.
    pub fn pending(&self) -> Result<Vec<(u64, HistoryRecord)>, HistoryError> {
        let prefix = HISTORY_PREFIX;
        let mut out = Vec::new();
        for key in self.storage.keys_with_prefix(prefix)? {
            if let Some(id) = key[prefix.len()..].parse::<u64>().ok() {
                if let Some(record) = self.storage.get::<HistoryRecord>(&key)? {
                    if record.response.is_none() {
                        out.push((id, record));
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn records_and_resolves() {
        let history = History::new(MemoryStorage::new());
        history
            .record_request(1, "topic-a", RequestParams::SessionPing(()))
            .unwrap();

        assert!(history.get(1).unwrap().is_some());

        let resolved = history
            .resolve(1, ResponseParams::Success(serde_json::json!(true)))
            .unwrap();
        assert_eq!(resolved.topic, "topic-a");
        assert!(history.get(1).unwrap().is_none());
    }

    #[test]
    fn lists_pending_requests() {
        let history = History::new(MemoryStorage::new());
        history
            .record_request(1, "topic-a", RequestParams::SessionPing(()))
            .unwrap();

        let pending = history.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, 1);
    }
}
