//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::router;
use super::state::AppState;
use crate::error::{PhishguardError, Result};

/// HTTP server for the URL checking API.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// Shared application state
    state: AppState,
}

impl HttpServer {
    /// Create a new server.
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            error!(addr = %self.addr, error = %e, "Failed to bind HTTP listener");
            PhishguardError::Io(e)
        })?;
        Self::serve_listener(listener, self.state, signal).await
    }

    /// Serve on an already-bound listener until `signal` resolves.
    pub async fn serve_listener<F>(listener: TcpListener, state: AppState, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(addr = %addr, "Starting HTTP server with graceful shutdown");

        axum::serve(
            listener,
            router(state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            PhishguardError::Io(e)
        })
    }
}
