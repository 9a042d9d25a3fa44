//! Pipeline context management.
//!
//! Provides batch context for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one ingestion call.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub batch_id: String,
    pub channel_id: String,
    pub received_at: DateTime<Utc>,
}

impl BatchContext {
    pub fn new(channel_id: &str, received_at: DateTime<Utc>) -> Self {
        let batch_id = format!("batch-{}", &Uuid::new_v4().simple().to_string()[..8]);

        Self {
            batch_id,
            channel_id: channel_id.to_string(),
            received_at,
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.batch_id).with_channel(&self.channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_ids_are_short_and_distinct() {
        let now = Utc::now();
        let a = BatchContext::new("c1", now);
        let b = BatchContext::new("c1", now);

        assert!(a.batch_id.starts_with("batch-"));
        assert_eq!(a.batch_id.len(), "batch-".len() + 8);
        assert_ne!(a.batch_id, b.batch_id);
        assert_eq!(
            a.log_context().to_string(),
            format!("[batch={}] [channel=c1]", a.batch_id)
        );
    }
}
