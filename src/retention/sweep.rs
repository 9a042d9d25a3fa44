//! Retention sweep.
//!
//! Deletes a channel's records that have outlived the channel's expiration
//! window. Deletion is monotonic: concurrent or repeated sweeps of the same
//! channel converge on the same result without coordination.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::logging::structured::LogContext;
use crate::storage::{
    bounded, ChannelRepository, LogRecordStore, StorageError, DEFAULT_STORAGE_TIMEOUT,
};
use crate::{log_debug, log_info};

use super::policy::RetentionPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Runs retention sweeps against the storage collaborators.
#[derive(Clone)]
pub struct Sweeper {
    channels: Arc<dyn ChannelRepository>,
    records: Arc<dyn LogRecordStore>,
    storage_timeout: Duration,
}

impl Sweeper {
    pub fn new(channels: Arc<dyn ChannelRepository>, records: Arc<dyn LogRecordStore>) -> Self {
        Self {
            channels,
            records,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    /// Bound each storage call of a sweep by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Delete every record of `channel_id` created at or before the
    /// channel's cutoff relative to `now`.
    pub async fn sweep(
        &self,
        channel_id: &str,
        now: DateTime<Utc>,
        ctx: &LogContext,
    ) -> Result<u64, SweepError> {
        let channel = bounded(self.storage_timeout, self.channels.find_channel(channel_id))
            .await?
            .ok_or_else(|| SweepError::ChannelNotFound(channel_id.to_string()))?;

        let Some(cutoff) = RetentionPolicy::from_channel(&channel).cutoff(now) else {
            log_debug!(
                ctx,
                "SWEEP_SKIPPED",
                expiration_minutes = channel.expiration_minutes
            );
            return Ok(0);
        };
        log_debug!(
            ctx,
            "SWEEP_START",
            expiration_minutes = channel.expiration_minutes,
            cutoff = cutoff.to_rfc3339()
        );

        let deleted = bounded(
            self.storage_timeout,
            self.records.delete_where(channel_id, cutoff),
        )
        .await?;

        log_info!(ctx, "SWEEP_COMPLETE", deleted = deleted);
        Ok(deleted)
    }
}
