//! Audit trail of region value changes.
//!
//! Every committed change of a key is recorded once, as an immutable [`AuditRecord`] with a
//! per-key revision: the first change of a key is revision 1 and each further change adds
//! one. Records live next to the values in the same backend, under
//! `audit/<document>/<region>/<key>/<revision>`.
//!
//! ```rust
//! use strata_audit::{AuditTrail, Change};
//! use strata_storage::MemoryBackend;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), strata_audit::AuditError> {
//! let trail = AuditTrail::new(MemoryBackend::new());
//! let change = Change {
//!     document: "app",
//!     region: "eu",
//!     key: "server/port",
//!     author: "ops",
//!     old_value: "<None>",
//!     new_value: "9090",
//! };
//!
//! assert_eq!(trail.record(change).await?.revision, 1);
//! assert_eq!(trail.next_revision("app", "eu", "server/port").await?, 2);
//! # Ok(())
//! # }
//! ```

mod error;
mod trail;

pub use crate::error::{AuditError, AuditErrorExt, AuditErrorKind};
pub use crate::trail::{AuditTrail, Change, audit_prefix};
pub use strata_domain::audit::AuditRecord;
