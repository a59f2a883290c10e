//! Kernel utilities shared by strata binaries.
//! Keep this crate lightweight: configuration loading and backend bootstrap only.
//!
//! ## Config loading
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use strata_kernel::bootstrap::connect_backend;
//! use strata_kernel::config::load_strata_config;
//!
//! let config = load_strata_config(None)?;
//! let backend = connect_backend(&config.storage).await?;
//! # Ok(())
//! # }
//! ```
pub mod bootstrap;
pub mod config;

pub use strata_domain as domain;
