//! Fixed-window request limiting for the ingestion route.
//!
//! Each key (a channel id) gets `limit` requests per window. Every
//! decision carries the quota state that is echoed back to callers in
//! the `x-ratelimit-*` headers.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub const HEADER_CURRENT: &str = "x-ratelimit-current";
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Expired windows are pruned once more keys than this are tracked.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub limit: u64,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 60,
            window: Duration::seconds(60),
        }
    }
}

/// Quota state after counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests seen in the current window, this one included.
    pub current: u64,
    pub limit: u64,
    /// Unix seconds at which the current window ends.
    pub reset: i64,
}

impl RateLimitDecision {
    /// Header name/value pairs describing this decision.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            (HEADER_CURRENT, self.current.to_string()),
            (HEADER_LIMIT, self.limit.to_string()),
            (HEADER_RESET, self.reset.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: DateTime<Utc>,
    count: u64,
}

#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request for `key` at `now`.
    pub fn check(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let mut windows = self.windows.lock();

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.config.window;
            windows.retain(|_, w| now < w.started + window);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now >= window.started + self.config.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }
        window.count += 1;

        RateLimitDecision {
            allowed: window.count <= self.config.limit,
            current: window.count,
            limit: self.config.limit,
            reset: (window.started + self.config.window).timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn limiter(limit: u64) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(RateLimitConfig {
            limit,
            window: Duration::seconds(10),
        })
    }

    #[test]
    fn test_limit_within_window() {
        let limiter = limiter(2);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        assert!(limiter.check("c1", now).allowed);
        assert!(limiter.check("c1", now).allowed);
        let third = limiter.check("c1", now);
        assert!(!third.allowed);
        assert_eq!(third.current, 3);
        assert_eq!(third.limit, 2);
        assert_eq!(third.reset, now.timestamp() + 10);
    }

    #[test]
    fn test_window_rolls_over() {
        let limiter = limiter(1);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        assert!(limiter.check("c1", now).allowed);
        assert!(!limiter.check("c1", now + Duration::seconds(9)).allowed);
        let next = limiter.check("c1", now + Duration::seconds(10));
        assert!(next.allowed);
        assert_eq!(next.current, 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1);
        let now = Utc::now();
        assert!(limiter.check("c1", now).allowed);
        assert!(limiter.check("c2", now).allowed);
    }

    #[test]
    fn test_headers() {
        let decision = RateLimitDecision {
            allowed: true,
            current: 3,
            limit: 10,
            reset: 1_800_000_000,
        };
        let headers = decision.headers();
        assert_eq!(headers[0], (HEADER_CURRENT, "3".to_string()));
        assert_eq!(headers[2], (HEADER_RESET, "1800000000".to_string()));
    }
}
