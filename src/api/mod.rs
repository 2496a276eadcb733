//! HTTP API module
//!
//! This module contains the JSON-RPC endpoint, health/status handlers and
//! static file serving.

pub mod handlers;
pub mod responses;
pub mod rpc;

use std::{path::PathBuf, sync::Arc};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::state::AppState;
use handlers::*;

/// Options that change which routes and layers are installed
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Redirect requests not forwarded as https
    pub ensure_ssl: bool,
    /// Directory holding `index.html` and the dashboard assets
    pub static_path: Option<PathBuf>,
}

/// Create the HTTP router with all endpoints
///
/// `/health` and `/status` are never redirected to https.
pub fn create_router(state: Arc<AppState>, options: &RouterOptions) -> Router {
    let mut public = Router::new().route("/rpc", post(rpc_handler));

    if let Some(static_path) = &options.static_path {
        public = public
            .nest_service("/static", ServeDir::new(static_path))
            .route_service("/", ServeFile::new(static_path.join("index.html")));
    }

    if options.ensure_ssl {
        public = public.route_layer(middleware::from_fn(ensure_ssl));
    }

    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .merge(public)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
