//! # Domain Models
//!
//! This crate contains pure domain types with a single dependency (`serde`).
//! Keep it lean: no I/O, networking, or heavy logic. Just data and simple helpers.

pub mod audit;
pub mod config;
pub mod constants;
pub mod format;
pub mod model;
