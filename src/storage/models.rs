//! Database models for log storage.
//!
//! These models represent the structure of data in the database tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record type marker for events that arrived as structured JSON.
pub const RECORD_TYPE_JSON: &str = "json";

/// Thread marker for records with no originating thread.
pub const NO_THREAD: i32 = -1;

/// Level stored when an event does not carry one.
pub const DEFAULT_LEVEL: &str = "info";

/// A log stream with its own retention window.
///
/// Owned by the channel management side; ingestion only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// How long a record may live before it is eligible for deletion.
    pub expiration_minutes: i64,
}

impl Channel {
    pub fn new(id: &str, expiration_minutes: i64) -> Self {
        Self {
            id: id.to_string(),
            expiration_minutes,
        }
    }
}

/// A log record ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogRecord {
    pub level: String,
    /// Canonical JSON of the validated event.
    pub message: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub thread: i32,
    pub channel_id: String,
}

/// A persisted log record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLogRecord {
    pub id: u64,
    pub level: String,
    pub message: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub thread: i32,
    pub channel_id: String,
    /// Server-assigned insertion time, unrelated to the event's own timestamp.
    pub created: DateTime<Utc>,
}

impl StoredLogRecord {
    pub fn from_new(id: u64, record: NewLogRecord, created: DateTime<Utc>) -> Self {
        Self {
            id,
            level: record.level,
            message: record.message,
            record_type: record.record_type,
            thread: record.thread,
            channel_id: record.channel_id,
            created,
        }
    }
}
