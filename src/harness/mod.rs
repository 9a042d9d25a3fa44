//! Load harness module.
//!
//! Drives a fixed request rate against the ingestion endpoint:
//! - Per-request classification into success, rate-limited or error
//! - Last-known quota state from `x-ratelimit-*` headers
//! - Session totals and the printed report

pub mod outcome;
pub mod runner;
pub mod snapshot;
pub mod stats;

pub use outcome::*;
pub use runner::*;
pub use snapshot::*;
pub use stats::*;
