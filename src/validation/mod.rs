//! Batch validation module.
//!
//! Validates incoming log event batches against a declarative field table:
//! - Field table for events and the nested proxy record
//! - Typed events built from validated input
//! - Issue aggregation across the whole batch

pub mod event;
pub mod schema;

pub use event::*;
pub use schema::*;
