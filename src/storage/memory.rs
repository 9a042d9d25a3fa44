//! In-memory storage backend.
//!
//! Backs the reference server and the test suite. Implements both
//! collaborator traits over one mutex-guarded state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};
use super::models::{Channel, NewLogRecord, StoredLogRecord};
use super::store::{ChannelRepository, LogRecordStore, StorageError};

#[derive(Debug, Default)]
struct StoreState {
    channels: HashMap<String, Channel>,
    records: Vec<StoredLogRecord>,
    next_id: u64,
    /// Writes left before every further write fails. `None` = unlimited.
    writes_remaining: Option<usize>,
    write_delay: Option<Duration>,
}

/// Channels and log records held in process memory.
pub struct InMemoryLogStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryLogStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    /// Register or replace a channel.
    pub fn upsert_channel(&self, channel: Channel) {
        self.state.lock().channels.insert(channel.id.clone(), channel);
    }

    /// Records of one channel, oldest first.
    pub fn records_for(&self, channel_id: &str) -> Vec<StoredLogRecord> {
        self.state
            .lock()
            .records
            .iter()
            .filter(|r| r.channel_id == channel_id)
            .cloned()
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Let `n` more writes succeed, then fail every write after that.
    pub fn fail_writes_after(&self, n: usize) {
        self.state.lock().writes_remaining = Some(n);
    }

    /// Delay every write, e.g. to exercise caller timeouts.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.state.lock().write_delay = delay;
    }
}

#[async_trait]
impl ChannelRepository for InMemoryLogStore {
    async fn find_channel(&self, channel_id: &str) -> Result<Option<Channel>, StorageError> {
        Ok(self.state.lock().channels.get(channel_id).cloned())
    }
}

#[async_trait]
impl LogRecordStore for InMemoryLogStore {
    async fn create_record(&self, record: NewLogRecord) -> Result<StoredLogRecord, StorageError> {
        let delay = self.state.lock().write_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if let Some(remaining) = state.writes_remaining.as_mut() {
            if *remaining == 0 {
                return Err(StorageError::Unavailable(
                    "write quota exhausted".to_string(),
                ));
            }
            *remaining -= 1;
        }

        state.next_id += 1;
        let stored = StoredLogRecord::from_new(state.next_id, record, self.clock.now());
        state.records.push(stored.clone());
        Ok(stored)
    }

    async fn delete_where(
        &self,
        channel_id: &str,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let mut state = self.state.lock();
        let before = state.records.len();
        state
            .records
            .retain(|r| r.channel_id != channel_id || r.created > created_before);
        Ok((before - state.records.len()) as u64)
    }
}
