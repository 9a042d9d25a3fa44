//! Per-request classification.

use reqwest::StatusCode;
use thiserror::Error;

/// The request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError(format!("timed out: {}", e))
        } else {
            TransportError(e.to_string())
        }
    }
}

/// Bucket a single request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    Success,
    RateLimited,
    Error,
}

impl RequestOutcome {
    /// 429 is rate limited, 2xx is success, everything else is an error.
    pub fn classify(result: &Result<StatusCode, TransportError>) -> Self {
        match result {
            Ok(StatusCode::TOO_MANY_REQUESTS) => RequestOutcome::RateLimited,
            Ok(status) if status.is_success() => RequestOutcome::Success,
            Ok(_) | Err(_) => RequestOutcome::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::RateLimited => "rate-limited",
            RequestOutcome::Error => "error",
        }
    }
}
