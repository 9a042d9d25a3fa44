//! Storage collaborator interfaces.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{Channel, NewLogRecord, StoredLogRecord};

/// Failure talking to the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Default bound on a single storage call.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Await one storage call, failing with [`StorageError::Timeout`] once
/// `limit` has elapsed.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(limit)),
    }
}

/// Read access to channel settings.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn find_channel(&self, channel_id: &str) -> Result<Option<Channel>, StorageError>;
}

/// Write and expiry access to log records.
#[async_trait]
pub trait LogRecordStore: Send + Sync {
    /// Persist one record, stamping `created` with the server's clock.
    async fn create_record(&self, record: NewLogRecord) -> Result<StoredLogRecord, StorageError>;

    /// Delete every record of `channel_id` with `created <= created_before`.
    ///
    /// Returns the number of records removed.
    async fn delete_where(
        &self,
        channel_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StorageError>;
}
