//! Retention window arithmetic.

use chrono::{DateTime, Duration, Utc};

use crate::storage::Channel;

/// How long records of one channel are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub expiration_minutes: i64,
}

impl RetentionPolicy {
    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            expiration_minutes: minutes,
        }
    }

    pub fn from_channel(channel: &Channel) -> Self {
        Self::from_minutes(channel.expiration_minutes)
    }

    /// Records created at or before this instant are expired.
    ///
    /// `None` when the window reaches past the representable time range,
    /// in which case nothing has expired yet.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let expiration = Duration::try_minutes(self.expiration_minutes)?;
        now.checked_sub_signed(expiration)
    }

    pub fn is_expired(&self, created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now).is_some_and(|cutoff| created <= cutoff)
    }
}
