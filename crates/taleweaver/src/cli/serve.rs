//! HTTP server command handler.

use std::sync::Arc;
use taleweaver::{FlowRegistry, create_router};
use tokio::net::TcpListener;
use tracing::info;

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(
    registry: FlowRegistry,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind((host, port)).await?;
    info!(address = %listener.local_addr()?, "Taleweaver listening");

    let app = create_router(Arc::new(registry));
    axum::serve(listener, app).await?;
    Ok(())
}
