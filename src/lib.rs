//! Channel Logs Core - Batch log ingestion with sampled retention
//!
//! This crate accepts batches of log events posted for a channel, validates
//! them against a fixed event schema, persists one record per event, and
//! occasionally sweeps the channel's expired records. The implementation
//! prioritizes:
//!
//! 1. **Correctness** - A batch is validated as a whole before any write
//! 2. **Logging** - Every decision point logged with batch and channel context
//! 3. **Testability** - Storage, clock and randomness are injected
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Main ingestion orchestrator
//! - `validation` - Batch shape and event field validation
//! - `retention` - Expiration cutoffs, sweep sampling and execution
//! - `storage` - Collaborator traits, in-memory backend, SQL builders
//! - `http` - Ingestion route, rate limiting and the server loop
//! - `harness` - Fixed-rate load generator for the endpoint
//! - `config` - Environment-driven settings for both binaries
//! - `shutdown` - Ctrl+C handling for both binaries
//! - `logging` - Structured logging with batch context

pub mod config;
pub mod harness;
pub mod http;
pub mod logging;
pub mod pipeline;
pub mod retention;
pub mod shutdown;
pub mod storage;
pub mod validation;
