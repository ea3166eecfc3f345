//! CrewLine HTTP surface.
//!
//! Exposes the run façade over JSON/HTTP:
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `GET` | `/` | static service status |
//! | `GET` | `/health` | environment, model, and whether an API key is configured |
//! | `GET` | `/api/crew` | catalogue of available crews and the default topic |
//! | `POST` | `/api/crew` | runs a crew on `{"topic": ..., "mode"?: "full" \| "prototype"}` |
//!
//! Malformed requests get `400`, unknown paths `404`, and runs that panic or
//! exceed the configured time budget `500`, all with a
//! `{"success": false, "error": ...}` body. A crew run that fails on its own
//! terms is still a `200` carrying a failure envelope.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details, request validation, and CORS live
//! here. The [`nodes`] crate sees none of it.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

pub mod routes;

pub use routes::{router, ApiError, AppState, CrewRequest, ServiceInfo};

/// Errors raised while binding or running the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Binds a TCP listener on `addr`.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ListenerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ListenerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "crew API listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)
}
