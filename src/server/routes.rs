//! Router definition for the asset server.

use axum::{routing::get, Router};

use crate::common::ServeConfig;
use crate::server::assets;

/// Build the router: a health probe plus the asset fallback.
pub fn create_router(config: ServeConfig) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .fallback(get(assets::serve_asset))
        .with_state(config)
}
