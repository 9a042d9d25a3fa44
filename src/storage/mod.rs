//! Storage module.
//!
//! Record models, the collaborator traits the ingestion core consumes,
//! and an in-memory backend.

pub mod clock;
pub mod memory;
pub mod models;
pub mod store;

pub use clock::*;
pub use memory::*;
pub use models::*;
pub use store::*;
