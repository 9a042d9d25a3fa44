//! Running totals for a load-harness session.

use std::fmt;
use std::time::Duration;

use super::outcome::RequestOutcome;
use super::snapshot::RateLimitSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarnessStats {
    pub total_requests: u64,
    pub successes: u64,
    pub rate_limited: u64,
    pub errors: u64,
}

impl HarnessStats {
    pub fn record(&mut self, outcome: RequestOutcome) {
        self.total_requests += 1;
        match outcome {
            RequestOutcome::Success => self.successes += 1,
            RequestOutcome::RateLimited => self.rate_limited += 1,
            RequestOutcome::Error => self.errors += 1,
        }
    }

    pub fn record_batch(&mut self, outcomes: &[RequestOutcome]) {
        for outcome in outcomes {
            self.record(*outcome);
        }
    }

    /// Zero until any time has passed.
    pub fn requests_per_second(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.total_requests as f64 / secs
        }
    }

    pub fn report<'a>(&'a self, elapsed: Duration, snapshot: &'a RateLimitSnapshot) -> Report<'a> {
        Report {
            stats: self,
            elapsed,
            snapshot,
        }
    }
}

/// Human-readable session summary.
pub struct Report<'a> {
    stats: &'a HarnessStats,
    elapsed: Duration,
    snapshot: &'a RateLimitSnapshot,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Elapsed Time: {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "Total Requests: {}", self.stats.total_requests)?;
        writeln!(f, "Success: {}", self.stats.successes)?;
        writeln!(f, "Errors: {}", self.stats.errors)?;
        writeln!(f, "Rate-Limited: {}", self.stats.rate_limited)?;
        writeln!(
            f,
            "Requests per Second: {:.2}",
            self.stats.requests_per_second(self.elapsed)
        )?;
        write!(f, "{}", self.snapshot)
    }
}
