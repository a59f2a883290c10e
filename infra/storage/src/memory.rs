use crate::backend::{KvBackend, in_subtree};
use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tracing::debug;

/// A process-local backend over an ordered map.
///
/// Clones share the same map. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn collect<T>(&self, prefix: &str, map: impl Fn(&String, &String) -> T) -> Vec<T> {
        let entries = self.entries.read();
        entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| in_subtree(prefix, key))
            .map(|(key, value)| map(key, value))
            .collect()
    }
}

impl KvBackend for MemoryBackend {
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                message: "empty key".into(),
                context: Some("put".into()),
            });
        }
        self.entries.write().insert(key.to_owned(), value.to_owned());
        debug!(key, "Value stored in memory");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.collect(prefix, |key, _| key.clone()))
    }

    async fn list_subtree(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError> {
        Ok(self.collect(prefix, |key, value| (key.clone(), value.clone())))
    }

    async fn delete(&self, prefix: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !in_subtree(prefix, key));
        debug!(prefix, removed = before - entries.len(), "Subtree deleted from memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefix_is_hierarchical() {
        let backend = MemoryBackend::new();
        backend.put("doc/default/server/port", "1").await.unwrap();
        backend.put("doc/default/serverless", "2").await.unwrap();
        backend.put("doc/default/server", "3").await.unwrap();

        let keys = backend.list_keys("doc/default/server").await.unwrap();
        assert_eq!(keys, vec!["doc/default/server", "doc/default/server/port"]);

        backend.delete("doc/default/server").await.unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get("doc/default/serverless").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        clone.put("k", "v").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let backend = MemoryBackend::new();
        let err = backend.put("", "v").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
        assert!(backend.is_empty());
    }
}
