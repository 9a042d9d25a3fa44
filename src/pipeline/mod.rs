//! Pipeline orchestration module.
//!
//! Main log ingestion pipeline that coordinates:
//! - Batch validation
//! - Per-event persistence
//! - Sampled retention sweeps

pub mod context;
pub mod error;
pub mod ingestion;

pub use context::*;
pub use error::*;
pub use ingestion::*;
