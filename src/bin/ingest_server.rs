//! Reference ingestion server backed by the in-memory store.
//!
//! Channels are registered at startup from `INGEST_CHANNELS`; posts to any
//! other channel are still stored, but their sampled sweeps find no channel.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use channel_logs_core::config::ServerConfig;
use channel_logs_core::http::{serve, AppState, FixedWindowRateLimiter};
use channel_logs_core::logging::init_logger;
use channel_logs_core::pipeline::IngestionService;
use channel_logs_core::retention::{SweepSampler, ThreadRandom};
use channel_logs_core::shutdown::cancel_on_ctrl_c;
use channel_logs_core::storage::InMemoryLogStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger(log::LevelFilter::Info);

    let config = ServerConfig::from_env().context("invalid server configuration")?;

    let store = Arc::new(InMemoryLogStore::default());
    for channel in &config.channels {
        log::info!(
            "CHANNEL_REGISTERED channel={} expiration_minutes={}",
            channel.id,
            channel.expiration_minutes
        );
        store.upsert_channel(channel.clone());
    }

    let ingestion = IngestionService::new(store.clone(), store)
        .with_sampler(SweepSampler::new(
            config.sweep_probability,
            Box::new(ThreadRandom),
        ))
        .with_config(config.ingest_config());

    let state = Arc::new(AppState {
        ingestion,
        rate_limiter: config.rate_limit.map(FixedWindowRateLimiter::new),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    serve(listener, state, cancel).await.context("server failed")?;
    log::info!("SERVER_STOPPED");
    Ok(())
}
