//! HTTP server implementation.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};

use super::routes::{router, AppState};
use crate::error::{GeofactError, Result};

/// HTTP server for the Telegram webhook and status endpoints.
pub struct HttpServer {
    /// Bound listener
    listener: TcpListener,
    /// State shared with every route
    state: AppState,
}

impl HttpServer {
    /// Bind the listening socket.
    pub async fn bind(host: &str, port: u16, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind((host, port)).await.map_err(|e| {
            error!(host, port, error = %e, "Failed to bind HTTP listener");
            GeofactError::Io(e)
        })?;
        Ok(Self { listener, state })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `signal` resolves, then finish in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!(
            addr = %self.local_addr()?,
            "Starting HTTP server with graceful shutdown"
        );

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                GeofactError::Io(e)
            })
    }
}
