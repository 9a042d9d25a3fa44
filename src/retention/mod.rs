//! Retention module.
//!
//! Per-channel expiration and the sampled sweep that enforces it:
//! - Cutoff computation from a channel's expiration window
//! - Sweep execution against the storage collaborators
//! - Injectable random source deciding when ingestion also sweeps

pub mod policy;
pub mod sampler;
pub mod sweep;

pub use policy::*;
pub use sampler::*;
pub use sweep::*;
