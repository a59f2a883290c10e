//! Filesystem backend providing sandboxed, atomic, and compressed key storage.
//!
//! Every key owns a directory: `a/b/c` lives in `<root>/a/b/c/@value`. A key and the keys
//! below it therefore never collide, and deleting a subtree is a single directory removal.

use crate::backend::KvBackend;
use crate::builder::FileBackendBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance;
use crate::security::{self, VALUE_FILE};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    #[must_use]
    fn compress(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::None => data.to_vec(),
            Self::Lz4 => lz4_flex::compress_prepend_size(data),
        }
    }

    fn decompress(self, data: Vec<u8>) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::None => Ok(data),
            Self::Lz4 => {
                lz4_flex::decompress_size_prepended(&data).context("Lz4 decompression failed")
            },
        }
    }

    fn decode(self, data: Vec<u8>) -> Result<String, StorageError> {
        String::from_utf8(self.decompress(data)?).context("Stored value")
    }
}

/// The internal shared state of a [`FileBackend`] instance.
#[derive(Debug)]
pub struct FileBackendInner {
    /// The canonicalized physical path on the disk where all data is stored.
    pub(crate) root: PathBuf,
    /// Whether transparent LZ4 compression is enabled for this instance.
    pub(crate) compression: Compression,
    /// A unique counter used to generate temporary file names.
    pub(crate) tmp_counter: AtomicU64,
}

/// A thread-safe handle to a key/value store kept in a directory tree.
///
/// All key paths are validated so that no key can reach outside the root. It supports:
/// - **Atomic Writes**: a value is written to a unique temporary file, synced, then renamed.
/// - **Transparent Compression**: optional LZ4 block compression.
/// - **Self-Healing**: stale temporary files are removed when the backend connects.
///
/// The handle is reference-counted and can be cheaply cloned across tasks.
#[derive(Debug, Clone)]
pub struct FileBackend {
    pub(crate) inner: Arc<FileBackendInner>,
}

impl Deref for FileBackend {
    type Target = FileBackendInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FileBackend {
    #[must_use = "The backend is not initialized until you call .connect()"]
    pub fn builder() -> FileBackendBuilder {
        FileBackendBuilder::new()
    }

    /// The canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the directory that holds the value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for empty segments and
    /// [`StorageError::PathTraversalAttempt`] if the key would escape the root.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        security::resolve_key(&self.root, key)
    }

    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.root).await;
    }

    async fn write_value(&self, dir: &Path, data: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(dir)
            .await
            .context(format!("Failed to create key directory {}", dir.display()))?;

        let target = dir.join(VALUE_FILE);
        let temp = unique_tmp_path(&target, &self.tmp_counter);

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .await
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(data).await.context("Write failed")?;
            file.sync_all().await.context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&temp, &target).await {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                fs::remove_file(&target)
                    .await
                    .context(format!("Failed to replace existing value: {}", target.display()))?;
                fs::rename(&temp, &target).await.context(format!(
                    "Atomic swap failed: {} -> {}",
                    temp.display(),
                    target.display()
                ))?;
            } else {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::Io {
                    source: err,
                    context: Some(
                        format!("Atomic swap failed: {} -> {}", temp.display(), target.display())
                            .into(),
                    ),
                });
            }
        }

        sync_dir(dir).await;
        Ok(())
    }

    /// Walks the subtree of `prefix` and returns the value file of every key found.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, PathBuf)>, StorageError> {
        let start = self.resolve(prefix)?;
        let root = self.root.clone();

        let mut found = tokio::task::spawn_blocking(move || collect_value_files(&root, &start))
            .await
            .context("Subtree scan")??;
        found.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    /// Removes empty directories between `dir` and the root.
    async fn prune_empty_parents(&self, dir: &Path) {
        let mut current = dir.parent();
        while let Some(path) = current {
            if path == self.root.as_path() || fs::remove_dir(path).await.is_err() {
                break;
            }
            current = path.parent();
        }
    }
}

impl KvBackend for FileBackend {
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                message: "empty key".into(),
                context: Some("put".into()),
            });
        }
        let dir = self.resolve(key)?;
        let data = self.compression.compress(value.as_bytes());
        self.write_value(&dir, &data).await?;
        debug!(key, path = %dir.display(), "Value saved atomically");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if key.is_empty() {
            return Ok(None);
        }
        let target = self.resolve(key)?.join(VALUE_FILE);

        match fs::read(&target).await {
            Ok(data) => self.compression.decode(data).map(Some),
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(None)
            },
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Read failed: {}", target.display()).into()),
            }),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.scan(prefix).await?.into_iter().map(|(key, _)| key).collect())
    }

    async fn list_subtree(&self, prefix: &str) -> Result<Vec<(String, String)>, StorageError> {
        let files = self.scan(prefix).await?;
        let mut out = Vec::with_capacity(files.len());
        for (key, path) in files {
            match fs::read(&path).await {
                Ok(data) => out.push((key, self.compression.decode(data)?)),
                // Removed by a concurrent delete between the scan and the read.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
                Err(err) => {
                    return Err(StorageError::Io {
                        source: err,
                        context: Some(format!("Read failed: {}", path.display()).into()),
                    });
                },
            }
        }
        Ok(out)
    }

    async fn delete(&self, prefix: &str) -> Result<(), StorageError> {
        let dir = self.resolve(prefix)?;

        if prefix.is_empty() {
            let mut entries =
                fs::read_dir(&dir).await.context("Failed to list storage root")?;
            while let Some(entry) = entries.next_entry().await.context("Root listing")? {
                let path = entry.path();
                let removed = if entry.file_type().await.context("Root listing")?.is_dir() {
                    fs::remove_dir_all(&path).await
                } else {
                    fs::remove_file(&path).await
                };
                removed.context(format!("Failed to delete: {}", path.display()))?;
            }
        } else {
            match fs::remove_dir_all(&dir).await {
                Ok(()) => self.prune_empty_parents(&dir).await,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(err) => {
                    return Err(StorageError::Io {
                        source: err,
                        context: Some(format!("Failed to delete: {}", dir.display()).into()),
                    });
                },
            }
        }

        debug!(prefix, path = %dir.display(), "Subtree deleted");
        Ok(())
    }
}

fn collect_value_files(root: &Path, start: &Path) -> Result<Vec<(String, PathBuf)>, StorageError> {
    if !start.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(start) {
        let entry = match entry {
            Ok(entry) => entry,
            // A directory removed mid-walk.
            Err(err) if err.io_error().is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound) => {
                continue;
            },
            Err(err) => {
                return Err(StorageError::Io {
                    source: err.into(),
                    context: Some(format!("Walk failed below {}", start.display()).into()),
                });
            },
        };
        if !entry.file_type().is_file() || entry.file_name() != VALUE_FILE {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else { continue };
        if let Some(key) = security::relative_to_key(relative) {
            found.push((key, entry.into_path()));
        }
    }
    Ok(found)
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                tracing::warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!("{VALUE_FILE}{}{counter}", maintenance::TMP_MARKER))
}
