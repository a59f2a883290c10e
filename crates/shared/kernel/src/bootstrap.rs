use strata_domain::config::{BackendKind, StorageConfig};
use strata_storage::{AnyBackend, Compression, FileBackend, MemoryBackend, StorageError};
use tracing::info;

/// Opens the backend selected by the `storage` configuration section.
///
/// # Errors
/// Returns the [`StorageError`] of [`FileBackend`] initialization, e.g. a missing root
/// with `create = false`.
pub async fn connect_backend(config: &StorageConfig) -> Result<AnyBackend, StorageError> {
    match config.backend {
        BackendKind::Memory => {
            info!("Using in-memory backend");
            Ok(MemoryBackend::new().into())
        },
        BackendKind::File => {
            let compression = if config.compression { Compression::Lz4 } else { Compression::None };
            let backend = FileBackend::builder()
                .root(&config.root)
                .create(config.create)
                .compression(compression)
                .connect()
                .await?;
            info!(root = %backend.root().display(), ?compression, "Using filesystem backend");
            Ok(backend.into())
        },
    }
}
