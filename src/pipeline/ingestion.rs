//! Main log ingestion pipeline.
//!
//! Coordinates one ingestion call:
//! 1. Body presence check
//! 2. Batch validation (all-or-nothing)
//! 3. Persistence, one record per event
//! 4. Sampled retention sweep for the channel
//! 5. Accepted count back to the caller

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::retention::{SweepError, SweepSampler, Sweeper};
use crate::storage::{
    bounded, ChannelRepository, Clock, LogRecordStore, NewLogRecord, SystemClock, DEFAULT_LEVEL,
    DEFAULT_STORAGE_TIMEOUT, NO_THREAD, RECORD_TYPE_JSON,
};
use crate::validation::{validate_batch, LogEvent};
use crate::{log_debug, log_error, log_info, log_warn};

use super::context::BatchContext;
use super::error::IngestError;

/// What to do when a sampled sweep fails after the batch was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepFailurePolicy {
    /// Log it; the ingestion call still succeeds.
    #[default]
    Swallow,
    /// Return it to the caller (404 for a missing channel).
    Surface,
}

impl std::str::FromStr for SweepFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "swallow" => Ok(SweepFailurePolicy::Swallow),
            "surface" => Ok(SweepFailurePolicy::Surface),
            other => Err(format!("unknown sweep failure policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub storage_timeout: Duration,
    pub sweep_failure_policy: SweepFailurePolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            sweep_failure_policy: SweepFailurePolicy::default(),
        }
    }
}

/// What happened to the retention sweep on an accepted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Skipped,
    Completed { deleted: u64 },
    /// Swallowed failure, kept for the caller's logs.
    Failed(String),
}

/// Result of a successful ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub batch_id: String,
    pub accepted: usize,
    pub sweep: SweepOutcome,
}

/// Validates, persists and opportunistically expires channel logs.
pub struct IngestionService {
    records: Arc<dyn LogRecordStore>,
    sweeper: Sweeper,
    sampler: SweepSampler,
    clock: Arc<dyn Clock>,
    config: IngestConfig,
}

impl IngestionService {
    pub fn new(channels: Arc<dyn ChannelRepository>, records: Arc<dyn LogRecordStore>) -> Self {
        Self {
            sweeper: Sweeper::new(channels, Arc::clone(&records)),
            records,
            sampler: SweepSampler::default(),
            clock: Arc::new(SystemClock),
            config: IngestConfig::default(),
        }
    }

    pub fn with_sampler(mut self, sampler: SweepSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.sweeper = self.sweeper.with_timeout(config.storage_timeout);
        self.config = config;
        self
    }

    /// Ingest a raw request body for `channel_id`.
    pub async fn ingest(
        &self,
        channel_id: &str,
        body: Option<&[u8]>,
    ) -> Result<IngestOutcome, IngestError> {
        let ctx = BatchContext::new(channel_id, self.clock.now());
        let log_ctx = ctx.log_context();

        let body = match body {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => bytes,
            _ => {
                log_warn!(log_ctx, "BODY_MISSING");
                return Err(IngestError::MissingBody);
            }
        };

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            log_warn!(log_ctx, "BODY_PARSE_FAILED", error = e.to_string());
            IngestError::Invalid(format!("Malformed JSON body: {}", e))
        })?;

        self.ingest_batch(ctx, Some(value)).await
    }

    /// Ingest an already-decoded request body for `channel_id`.
    pub async fn ingest_value(
        &self,
        channel_id: &str,
        body: Option<Value>,
    ) -> Result<IngestOutcome, IngestError> {
        let ctx = BatchContext::new(channel_id, self.clock.now());
        self.ingest_batch(ctx, body).await
    }

    async fn ingest_batch(
        &self,
        ctx: BatchContext,
        body: Option<Value>,
    ) -> Result<IngestOutcome, IngestError> {
        let log_ctx = ctx.log_context();

        let body = match body {
            None | Some(Value::Null) => {
                log_warn!(log_ctx, "BODY_MISSING");
                return Err(IngestError::MissingBody);
            }
            Some(value) => value,
        };

        log_info!(
            log_ctx,
            "BATCH_RECEIVED",
            events = body.as_array().map(|a| a.len())
        );

        // [1] VALIDATION
        let events = validate_batch(&body).map_err(|failure| {
            log_warn!(
                log_ctx,
                "SCHEMA_INVALID",
                issues = failure.issues().len(),
                reason = failure.message()
            );
            IngestError::Invalid(failure.message())
        })?;

        // [2] PERSISTENCE
        let persisted = self.persist_events(&ctx, &events).await;

        // [3] SAMPLED SWEEP, once per batch whatever persistence did
        let sweep = self.maybe_sweep(&ctx).await;

        let accepted = persisted?;
        let sweep = match sweep {
            Ok(outcome) => outcome,
            Err(e) => match self.config.sweep_failure_policy {
                SweepFailurePolicy::Swallow => {
                    log_warn!(log_ctx, "SWEEP_FAILED_IGNORED", error = e.to_string());
                    SweepOutcome::Failed(e.to_string())
                }
                SweepFailurePolicy::Surface => {
                    log_error!(log_ctx, "SWEEP_FAILED", error = e.to_string());
                    return Err(match e {
                        SweepError::ChannelNotFound(id) => IngestError::ChannelNotFound(id),
                        SweepError::Storage(err) => IngestError::StorageFailure(err),
                    });
                }
            },
        };

        log_info!(
            log_ctx,
            "BATCH_COMPLETE",
            accepted = accepted,
            sweep = &sweep,
            elapsed_ms = (self.clock.now() - ctx.received_at).num_milliseconds()
        );

        Ok(IngestOutcome {
            batch_id: ctx.batch_id,
            accepted,
            sweep,
        })
    }

    /// Write one record per event, in order. The first failure stops the
    /// batch; records already written stay.
    async fn persist_events(
        &self,
        ctx: &BatchContext,
        events: &[LogEvent],
    ) -> Result<usize, IngestError> {
        let log_ctx = ctx.log_context();

        for (index, event) in events.iter().enumerate() {
            let record = NewLogRecord {
                level: stored_level(event).to_string(),
                message: canonical_message(event),
                record_type: RECORD_TYPE_JSON.to_string(),
                thread: NO_THREAD,
                channel_id: ctx.channel_id.clone(),
            };

            let result =
                bounded(self.config.storage_timeout, self.records.create_record(record)).await;

            match result {
                Ok(stored) => {
                    log_debug!(log_ctx, "RECORD_PERSISTED", index = index, record_id = stored.id);
                }
                Err(e) => {
                    log_error!(
                        log_ctx,
                        "RECORD_PERSIST_FAILED",
                        index = index,
                        persisted = index,
                        remaining = events.len() - index,
                        error = e.to_string()
                    );
                    return Err(IngestError::StorageFailure(e));
                }
            }
        }

        Ok(events.len())
    }

    async fn maybe_sweep(&self, ctx: &BatchContext) -> Result<SweepOutcome, SweepError> {
        if !self.sampler.should_sweep() {
            return Ok(SweepOutcome::Skipped);
        }

        let log_ctx = ctx.log_context();
        log_info!(log_ctx, "SWEEP_TRIGGERED", probability = self.sampler.probability());

        let deleted = self
            .sweeper
            .sweep(&ctx.channel_id, self.clock.now(), &log_ctx)
            .await?;
        Ok(SweepOutcome::Completed { deleted })
    }
}

/// Level to store for an event.
pub fn stored_level(event: &LogEvent) -> &str {
    event.level.as_deref().unwrap_or(DEFAULT_LEVEL)
}

/// Canonical serialized form of a validated event.
pub fn canonical_message(event: &LogEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
}
