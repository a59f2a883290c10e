//! Region-layered key/value store.
//!
//! A document's values are kept per region. The `default` region is the baseline: a read
//! from any other region falls back to it, and an unforced write to another region must
//! override a value that exists in the default and differs from it.
//!
//! ```rust
//! use strata_domain::model::WriteOutcome;
//! use strata_storage::MemoryBackend;
//! use strata_store::Store;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), strata_store::StoreError> {
//! let store = Store::new(MemoryBackend::new());
//! let default = store.default_region("app")?;
//! let eu = store.region("app", "eu")?;
//!
//! default.write("server/port", "8080", "ops", false).await?;
//! assert_eq!(eu.read("server/port").await?, "8080");
//!
//! let outcome = eu.write("server/port", "9090", "ops", false).await?;
//! assert_eq!(outcome, WriteOutcome::Changed { revision: 1 });
//! assert_eq!(eu.read("server/port").await?, "9090");
//! # Ok(())
//! # }
//! ```

mod error;
mod region;
mod sequencer;

pub use crate::error::{StoreError, StoreErrorExt, StoreErrorKind};
pub use crate::region::{RegionStore, Store, validate_name};
pub use crate::sequencer::{Turn, WriteSequencer};
