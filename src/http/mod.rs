//! HTTP surface for the ingestion core.
//!
//! - Route handling and error-to-status mapping
//! - Fixed-window rate limiting with `x-ratelimit-*` headers
//! - A hyper server loop with graceful shutdown

pub mod rate_limit;
pub mod routes;
pub mod server;

pub use rate_limit::*;
pub use routes::*;
pub use server::*;
