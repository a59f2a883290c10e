use crate::backend::KvBackend;
use crate::engine::FileBackend;
use crate::error::StorageError;
use crate::memory::MemoryBackend;

/// A backend chosen at runtime, e.g. from configuration.
#[derive(Debug, Clone)]
pub enum AnyBackend {
    Memory(MemoryBackend),
    File(FileBackend),
}

impl From<MemoryBackend> for AnyBackend {
    fn from(backend: MemoryBackend) -> Self {
        Self::Memory(backend)
    }
}

impl From<FileBackend> for AnyBackend {
    fn from(backend: FileBackend) -> Self {
        Self::File(backend)
    }
}

impl KvBackend for AnyBackend {
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Memory(b) => b.put(key, value).await,
            Self::File(b) => b.put(key, value).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Memory(b) => b.get(key).await,
            Self::File(b) => b.get(key).await,
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        match self {
            Self::Memory(b) => b.list_keys(prefix).await,
            Self::File(b) => b.list_keys(prefix).await,
        }
    }

    async fn list_subtree(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError> {
        match self {
            Self::Memory(b) => b.list_subtree(prefix).await,
            Self::File(b) => b.list_subtree(prefix).await,
        }
    }

    async fn delete(&self, prefix: &str) -> Result<(), StorageError> {
        match self {
            Self::Memory(b) => b.delete(prefix).await,
            Self::File(b) => b.delete(prefix).await,
        }
    }
}
