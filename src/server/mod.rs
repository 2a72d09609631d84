//! Static asset server: byte-for-byte delivery with ETag and
//! If-Modified-Since negotiation.

pub mod assets;
pub mod routes;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::common::ServeConfig;

/// Bind and run the asset server until shutdown.
pub async fn run(config: ServeConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        root = %config.root.display(),
        "serving assets on http://{}",
        listener.local_addr()?
    );

    let router = routes::create_router(config);
    axum::serve(listener, router)
        .await
        .context("Asset server terminated")
}
