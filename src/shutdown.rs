//! Shutdown signalling shared by the binaries.

use std::future::Future;
use std::io;

use tokio_util::sync::CancellationToken;

/// Cancel `token` once `signal` resolves successfully.
///
/// A listener that fails to install leaves the token untouched.
pub async fn cancel_on_signal<F>(signal: F, token: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            log::info!("SHUTDOWN_REQUESTED");
            token.cancel();
        }
        Err(e) => log::error!("SIGNAL_LISTEN_FAILED error={}", e),
    }
}

/// Spawn a task that cancels `token` on Ctrl+C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), token));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_cancels_token() {
        let token = CancellationToken::new();
        cancel_on_signal(async { Ok(()) }, token.clone()).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_listener_keeps_running() {
        let token = CancellationToken::new();
        cancel_on_signal(
            async { Err(io::Error::new(io::ErrorKind::Other, "no signal handler")) },
            token.clone(),
        )
        .await;
        assert!(!token.is_cancelled());
    }
}
