use crate::engine::{Compression, FileBackend, FileBackendInner};
use crate::error::{StorageError, StorageErrorExt};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone)]
struct BackendOptions {
    compression: Compression,
    create: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self { compression: Compression::None, create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

/// Type-state builder for [`FileBackend`]; `connect` is only reachable once a root is set.
#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct FileBackendBuilder<S: Sealed = NoRoot> {
    state: S,
    options: BackendOptions,
}

#[allow(private_bounds)]
impl<S: Sealed> FileBackendBuilder<S> {
    #[must_use = "Sets compression for stored values"]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    #[must_use = "Sets whether the root directory should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.options.create = enable;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> FileBackendBuilder<N> {
        FileBackendBuilder { state, options: self.options }
    }
}

impl FileBackendBuilder<NoRoot> {
    #[must_use = "Creates a new backend builder with default options"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory of the backend"]
    pub fn root(self, path: impl Into<PathBuf>) -> FileBackendBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl FileBackendBuilder<WithRoot> {
    /// Consumes the builder and opens the backend.
    ///
    /// Boot sequence:
    /// 1. **Bootstrapping**: creates the root directory if `create(true)` was set.
    /// 2. **Canonicalization**: resolves the root to an absolute physical path, so symlinked
    ///    key directories can be detected.
    /// 3. **Self-Healing**: removes temporary files orphaned by interrupted writes.
    ///
    /// Cleanup failures are logged and never abort the connection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the root does not exist and `create` is false, or
    /// if it cannot be created or resolved.
    pub async fn connect(self) -> Result<FileBackend, StorageError> {
        let root = &self.state.0;

        if self.options.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
            info!(path = %root.display(), "Bootstrapped storage root directory");
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;

        let backend = FileBackend {
            inner: Arc::new(FileBackendInner {
                root: canonical,
                compression: self.options.compression,
                tmp_counter: AtomicU64::new(1),
            }),
        };

        backend.purge_tmp().await;

        Ok(backend)
    }
}
