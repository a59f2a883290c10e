//! Key/value backends for the layered configuration store.
//!
//! Every backend implements the small CRUD contract of [`KvBackend`]: `put`, `get`,
//! `list_keys`, `list_subtree` and `delete`. Keys are `/`-separated hierarchies and every
//! prefix argument is hierarchical: `server` matches `server` and `server/port`, never
//! `serverless`. The empty prefix matches everything.
//!
//! # Backends
//!
//! 1.  **[`MemoryBackend`]**: a process-local ordered map, used by tests and ephemeral runs.
//! 2.  **[`FileBackend`]**: a sandboxed directory tree with atomic writes
//!     (unique temp write + `fsync` + `rename`), optional LZ4 compression and self-healing
//!     of orphaned temporary files on connect.
//! 3.  **[`AnyBackend`]**: runtime selection between the two.
//!
//! # Examples
//!
//! ```rust
//! use strata_storage::{KvBackend, MemoryBackend, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     let backend = MemoryBackend::new();
//!     backend.put("auth/default/server/port", "8080").await?;
//!     backend.put("auth/default/server/host", "\"localhost\"").await?;
//!
//!     let subtree = backend.list_subtree("auth/default/server").await?;
//!     assert_eq!(subtree.len(), 2);
//!
//!     backend.delete("auth/default").await?;
//!     assert!(backend.get("auth/default/server/port").await?.is_none());
//!     Ok(())
//! }
//! ```
//!
//! ```rust
//! use strata_storage::{Compression, FileBackend, KvBackend, StorageError};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), StorageError> {
//! # let tmp = tempfile::tempdir().unwrap();
//! # let root = tmp.path().join("data");
//! let backend = FileBackend::builder()
//!     .root(&root)
//!     .create(true)
//!     .compression(Compression::Lz4)
//!     .connect()
//!     .await?;
//!
//! backend.put("auth/default/server/port", "8080").await?;
//! assert_eq!(backend.get("auth/default/server/port").await?.as_deref(), Some("8080"));
//! # Ok(())
//! # }
//! ```

mod any;
mod backend;
mod builder;
mod engine;
mod error;
mod maintenance;
mod memory;
mod security;

pub use any::AnyBackend;
pub use backend::{KvBackend, in_subtree};
pub use builder::FileBackendBuilder;
pub use engine::{Compression, FileBackend};
pub use error::{StorageError, StorageErrorExt, StorageErrorKind};
pub use memory::MemoryBackend;
