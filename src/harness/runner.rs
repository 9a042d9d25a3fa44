//! Fixed-rate request loop.
//!
//! Every period the harness fires `batch_size` concurrent POSTs at the
//! target, waits for all of them, folds the results into its totals and
//! prints a report. Cancellation stops the loop before the next tick.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::HarnessConfig;

use super::outcome::{RequestOutcome, TransportError};
use super::snapshot::RateLimitSnapshot;
use super::stats::HarnessStats;

type Response = Result<(StatusCode, HeaderMap), TransportError>;

pub struct LoadHarness {
    client: reqwest::Client,
    target_url: Arc<str>,
    payload: Arc<str>,
    period: Duration,
    batch_size: usize,
    stats: HarnessStats,
    snapshot: RateLimitSnapshot,
    started: Instant,
}

impl LoadHarness {
    pub fn new(config: HarnessConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            target_url: config.target_url.into(),
            payload: config.payload.into(),
            period: config.period,
            batch_size: config.batch_size,
            stats: HarnessStats::default(),
            snapshot: RateLimitSnapshot::default(),
            started: Instant::now(),
        })
    }

    pub fn stats(&self) -> &HarnessStats {
        &self.stats
    }

    pub fn snapshot(&self) -> &RateLimitSnapshot {
        &self.snapshot
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn report(&self) -> String {
        self.stats.report(self.elapsed(), &self.snapshot).to_string()
    }

    /// Fire one batch and wait for every request in it.
    pub async fn run_tick(&mut self) -> Vec<RequestOutcome> {
        let mut requests = JoinSet::new();
        for _ in 0..self.batch_size {
            let client = self.client.clone();
            let url = self.target_url.clone();
            let payload = self.payload.clone();
            requests.spawn(async move { send(&client, &url, &payload).await });
        }

        let mut outcomes = Vec::with_capacity(self.batch_size);
        while let Some(joined) = requests.join_next().await {
            let result: Response = joined
                .map_err(|e| TransportError(format!("request task failed: {}", e)))
                .and_then(|r| r);

            let status = result.as_ref().map(|(status, _)| *status).map_err(Clone::clone);
            let outcome = RequestOutcome::classify(&status);
            match &result {
                Ok((status, headers)) => {
                    self.snapshot.observe(headers);
                    log::debug!(
                        "HARNESS_RESPONSE status={} outcome={}",
                        status.as_u16(),
                        outcome.as_str()
                    );
                }
                Err(e) => log::warn!(
                    "HARNESS_REQUEST_FAILED url={} outcome={} error={}",
                    self.target_url,
                    outcome.as_str(),
                    e
                ),
            }
            outcomes.push(outcome);
        }

        self.stats.record_batch(&outcomes);
        outcomes
    }

    /// Tick until `cancel` fires, printing a report after each batch.
    pub async fn run(&mut self, cancel: CancellationToken) -> HarnessStats {
        log::info!(
            "HARNESS_START url={} period_ms={} batch_size={}",
            self.target_url,
            self.period.as_millis(),
            self.batch_size
        );
        self.started = Instant::now();

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.run_tick().await;
                    println!("{}\n", self.report());
                }
            }
        }

        log::info!(
            "HARNESS_STOP total={} elapsed_ms={}",
            self.stats.total_requests,
            self.elapsed().as_millis()
        );
        self.stats
    }
}

async fn send(client: &reqwest::Client, url: &str, payload: &str) -> Response {
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(payload.to_string())
        .send()
        .await?;
    Ok((response.status(), response.headers().clone()))
}
