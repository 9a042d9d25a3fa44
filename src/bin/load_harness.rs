//! Fixed-rate load generator for the ingestion endpoint.
//!
//! Runs until Ctrl+C, then prints the final report and exits cleanly.

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use channel_logs_core::config::HarnessConfig;
use channel_logs_core::harness::LoadHarness;
use channel_logs_core::logging::init_logger;
use channel_logs_core::shutdown::cancel_on_ctrl_c;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger(log::LevelFilter::Warn);

    let config = HarnessConfig::from_env().context("invalid harness configuration")?;
    let mut harness = LoadHarness::new(config).context("failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    harness.run(cancel).await;

    println!("Final Report:");
    println!("{}", harness.report());
    Ok(())
}
