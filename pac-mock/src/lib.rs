//! Development PAC
//!
//! Implements the HTTP contract of `pac_client::wire` in memory: stamps
//! sealed CFDIs with a TimbreFiscalDigital, detects duplicates, cancels
//! and answers status queries. Failures and latency can be scripted.

pub mod api;
pub mod state;

pub use api::router;
pub use state::{MockState, ScriptedFailure, StampedDocument};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Bind `addr` and serve in a background task; returns the bound address
pub async fn spawn(addr: &str, state: Arc<MockState>) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let app = router(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Mock PAC server stopped");
        }
    });

    Ok(local_addr)
}
