// Chat Relay: Dashboard Server
// Binds the listener and serves the router until shutdown.

use super::{router, Dashboard};
use chatrelay_core::EngineResult;
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve the dashboard until `shutdown` resolves.
pub async fn run_server<F>(dashboard: Arc<Dashboard>, shutdown: F) -> EngineResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let settings = &dashboard.settings().dashboard;
    let addr = format!("{}:{}", settings.bind_address, settings.port);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Bind {} failed: {}", addr, e))?;

    if settings.bind_address != "127.0.0.1" && settings.bind_address != "localhost" {
        warn!("[dashboard] Binding to {}: credentials typed into the page cross the network in plaintext", settings.bind_address);
    }
    info!("[dashboard] Listening on http://{}", addr);

    axum::serve(listener, router(dashboard.clone()))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("[dashboard] Shut down");
    Ok(())
}
