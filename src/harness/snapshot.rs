//! Last-known server quota state.

use std::fmt;

use reqwest::header::HeaderMap;

use crate::http::rate_limit::{HEADER_CURRENT, HEADER_LIMIT, HEADER_RESET};

/// Quota state as reported by `x-ratelimit-*` headers.
///
/// A field stays at its last observed value when a response omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub limit: Option<u64>,
    pub current: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
}

impl RateLimitSnapshot {
    /// Fold one response's headers into the snapshot.
    pub fn observe(&mut self, headers: &HeaderMap) {
        if let Some(current) = header_u64(headers, HEADER_CURRENT) {
            self.current = Some(current);
        }
        if let Some(limit) = header_u64(headers, HEADER_LIMIT) {
            self.limit = Some(limit);
        }
        if let Some(reset) = header_u64(headers, HEADER_RESET) {
            self.reset = Some(reset);
        }
        if let (Some(limit), Some(current)) = (self.limit, self.current) {
            self.remaining = Some(limit.saturating_sub(current));
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

struct Field(Option<u64>);

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v),
            None => f.write_str("N/A"),
        }
    }
}

impl fmt::Display for RateLimitSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rate Limit Info:")?;
        writeln!(f, "  Current: {}", Field(self.current))?;
        writeln!(f, "  Remaining: {}", Field(self.remaining))?;
        writeln!(f, "  Limit: {}", Field(self.limit))?;
        write!(f, "  Reset: {}", Field(self.reset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_observe_full_set() {
        let mut snapshot = RateLimitSnapshot::default();
        snapshot.observe(&headers(&[
            (HEADER_CURRENT, "7"),
            (HEADER_LIMIT, "10"),
            (HEADER_RESET, "1800000000"),
        ]));

        assert_eq!(
            snapshot,
            RateLimitSnapshot {
                limit: Some(10),
                current: Some(7),
                remaining: Some(3),
                reset: Some(1_800_000_000),
            }
        );
    }

    #[test]
    fn test_missing_headers_keep_last_value() {
        let mut snapshot = RateLimitSnapshot::default();
        snapshot.observe(&headers(&[(HEADER_CURRENT, "7"), (HEADER_LIMIT, "10")]));
        snapshot.observe(&headers(&[(HEADER_CURRENT, "9")]));
        snapshot.observe(&HeaderMap::new());

        assert_eq!(snapshot.limit, Some(10));
        assert_eq!(snapshot.current, Some(9));
        assert_eq!(snapshot.remaining, Some(1));
        assert_eq!(snapshot.reset, None);
    }

    #[test]
    fn test_unparseable_header_is_ignored() {
        let mut snapshot = RateLimitSnapshot::default();
        snapshot.observe(&headers(&[(HEADER_LIMIT, "10")]));
        snapshot.observe(&headers(&[(HEADER_LIMIT, "lots")]));
        assert_eq!(snapshot.limit, Some(10));
    }

    #[test]
    fn test_remaining_saturates() {
        let mut snapshot = RateLimitSnapshot::default();
        snapshot.observe(&headers(&[(HEADER_CURRENT, "12"), (HEADER_LIMIT, "10")]));
        assert_eq!(snapshot.remaining, Some(0));
    }

    #[test]
    fn test_display_unknown_fields() {
        let text = RateLimitSnapshot::default().to_string();
        assert!(text.contains("Current: N/A"));
        assert!(text.contains("Reset: N/A"));
    }
}
