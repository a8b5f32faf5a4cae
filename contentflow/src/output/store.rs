//! Persistence of final outputs.

use crate::errors::StorageError;
use crate::utils::{now_utc, Timestamp};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A run's final output as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedArtifact {
    /// The execution that produced it.
    pub execution_id: String,
    /// The final output.
    pub final_output: serde_json::Value,
    /// When it was written.
    pub created_at: Timestamp,
    /// When it stops being served.
    pub expires_at: Timestamp,
}

impl PersistedArtifact {
    /// Returns true if the artifact has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Storage for final outputs, keyed by execution id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Writes an artifact, replacing any previous one for the execution.
    async fn save(&self, artifact: PersistedArtifact) -> Result<(), StorageError>;

    /// Reads an unexpired artifact.
    async fn load(&self, execution_id: &str) -> Result<Option<PersistedArtifact>, StorageError>;

    /// Deletes expired artifacts, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, StorageError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryExecutionStore {
    entries: DashMap<String, PersistedArtifact>,
}

impl InMemoryExecutionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn save(&self, artifact: PersistedArtifact) -> Result<(), StorageError> {
        debug!(execution_id = %artifact.execution_id, "Persisting final output");
        self.entries.insert(artifact.execution_id.clone(), artifact);
        Ok(())
    }

    async fn load(&self, execution_id: &str) -> Result<Option<PersistedArtifact>, StorageError> {
        let now = now_utc();
        if self
            .entries
            .remove_if(execution_id, |_, artifact| artifact.is_expired_at(now))
            .is_some()
        {
            return Ok(None);
        }
        Ok(self
            .entries
            .get(execution_id)
            .map(|entry| entry.clone())
            .filter(|artifact| !artifact.is_expired_at(now)))
    }

    async fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = now_utc();
        let before = self.entries.len();
        self.entries.retain(|_, artifact| !artifact.is_expired_at(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn artifact(id: &str, ttl: Duration) -> PersistedArtifact {
        let now = now_utc();
        PersistedArtifact {
            execution_id: id.to_string(),
            final_output: serde_json::json!({"content": "Y"}),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemoryExecutionStore::new();
        store.save(artifact("e1", Duration::hours(24))).await.unwrap();

        let loaded = store.load("e1").await.unwrap().unwrap();
        assert_eq!(loaded.final_output["content"], "Y");
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_artifacts_are_not_served() {
        let store = InMemoryExecutionStore::new();
        store.save(artifact("old", Duration::seconds(-1))).await.unwrap();

        assert!(store.load("old").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_expiry_on_load_never_drops_a_fresh_replacement() {
        for _ in 0..50 {
            let store = std::sync::Arc::new(InMemoryExecutionStore::new());
            store.save(artifact("e1", Duration::seconds(-1))).await.unwrap();

            let loaders: Vec<_> = (0..4)
                .map(|_| {
                    let store = std::sync::Arc::clone(&store);
                    tokio::spawn(async move {
                        for _ in 0..50 {
                            store.load("e1").await.unwrap();
                        }
                    })
                })
                .collect();
            store.save(artifact("e1", Duration::hours(1))).await.unwrap();
            for loader in loaders {
                loader.await.unwrap();
            }

            let loaded = store.load("e1").await.unwrap();
            assert!(loaded.is_some_and(|a| a.expires_at > now_utc()));
        }
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemoryExecutionStore::new();
        store.save(artifact("old", Duration::seconds(-5))).await.unwrap();
        store.save(artifact("fresh", Duration::hours(1))).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }
}
