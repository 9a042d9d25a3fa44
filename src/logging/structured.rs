//! Structured logging utilities.
//!
//! Provides context-aware logging with batch_id and channel_id included
//! in every log message.

use std::fmt;

/// Logging context for one ingestion batch.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub batch_id: String,
    pub channel_id: Option<String>,
}

impl LogContext {
    pub fn new(batch_id: &str) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            channel_id: None,
        }
    }

    pub fn with_channel(&self, channel_id: &str) -> Self {
        Self {
            batch_id: self.batch_id.clone(),
            channel_id: Some(channel_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel_id {
            Some(cid) => write!(f, "[batch={}] [channel={}]", self.batch_id, cid),
            None => write!(f, "[batch={}]", self.batch_id),
        }
    }
}

/// Initialize the process-wide logger.
///
/// `RUST_LOG` takes precedence over `default_level`. Safe to call more than once.
pub fn init_logger(default_level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::error!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_display() {
        let ctx = LogContext::new("batch-123");
        assert_eq!(format!("{}", ctx), "[batch=batch-123]");

        let ctx_with_channel = ctx.with_channel("c1");
        assert_eq!(
            format!("{}", ctx_with_channel),
            "[batch=batch-123] [channel=c1]"
        );
    }

    #[test]
    fn test_macros_accept_fields() {
        let ctx = LogContext::new("batch-1").with_channel("c1");
        crate::log_info!(ctx, "TEST_EVENT", count = 3, name = "x");
        crate::log_debug!(ctx, "TEST_EVENT_NO_FIELDS");
    }
}
