//! Facade crate for strata.
//! Re-exports the domain, kernel and feature crates and composes them into [`Strata`].
//! Keep this crate thin: it should compose other crates, not implement codec or store logic.
//!
//! ## Usage
//! ```rust
//! use strata::Strata;
//! use strata::document::Template;
//! use strata::domain::format::OutputFormat;
//! use strata::storage::MemoryBackend;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), strata::StrataError> {
//! let strata = Strata::new(MemoryBackend::new());
//! let template = Template::parse(r#"{"server": {"port": 8080}}"#, OutputFormat::Json)?;
//! strata.import("app", &template, "ops").await?;
//!
//! strata.region("app", "eu")?.write("server/port", "9090", "ops", false).await?;
//!
//! let mut out = Vec::new();
//! strata.generate("app", "eu", OutputFormat::Yaml, &mut out).await?;
//! assert_eq!(String::from_utf8_lossy(&out), "server:\n  port: 9090\n");
//! # Ok(())
//! # }
//! ```

mod error;
mod generator;
mod registry;
mod service;

pub use crate::error::{StrataError, StrataErrorExt, StrataErrorKind};
pub use crate::generator::ConfigGenerator;
pub use crate::registry::DocumentRegistry;
pub use crate::service::Strata;

pub use strata_audit as audit;
pub use strata_document as document;
pub use strata_domain as domain;
pub use strata_kernel as kernel;
pub use strata_storage as storage;
pub use strata_store as store;
