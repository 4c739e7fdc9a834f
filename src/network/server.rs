//! Connection accept loop

use std::future::Future;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::HandlerService;
use crate::context::Handler;

/// Serve connections from `listener` until `shutdown` resolves or the
/// process receives Ctrl-C
///
/// Each connection is served on its own task with HTTP/1 or HTTP/2,
/// whichever the client speaks. Connections in flight are not awaited.
pub async fn serve<H, F>(listener: TcpListener, service: HandlerService<H>, shutdown: F)
where
    H: Handler + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };
                let service = service.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    if let Err(e) = auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await
                    {
                        debug!("Connection from {} closed: {}", peer, e);
                    }
                });
            }
            () = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
        }
    }
}
