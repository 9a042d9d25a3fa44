//! HTTP/1 server for the ingestion endpoint.

use std::io;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::routes::{handle_request, AppState};

/// Accept connections until `cancel` fires, then let open connections
/// finish their current request and return.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    cancel: CancellationToken,
) -> io::Result<()> {
    let mut connections = JoinSet::new();
    log::info!("SERVER_LISTENING addr={}", listener.local_addr()?);

    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionRefused
                ) => {
                    log::debug!("ACCEPT_SKIPPED error={}", e);
                    continue;
                }
                Err(e) => {
                    log::error!("ACCEPT_FAILED error={}", e);
                    return Err(e);
                }
            },
        };

        let state = Arc::clone(&state);
        let cancel = cancel.clone();
        connections.spawn(async move {
            let service = service_fn(move |req| handle_request(Arc::clone(&state), req));
            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = cancel.cancelled() => {
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };
            if let Err(e) = result {
                log::debug!("CONNECTION_CLOSED peer={} error={}", peer, e);
            }
        });

        // Reap finished connections so the set does not grow unbounded.
        while connections.try_join_next().is_some() {}
    }

    log::info!("SERVER_STOPPING open_connections={}", connections.len());
    while connections.join_next().await.is_some() {}
    Ok(())
}
