//! HTTP gateway for TFS.
//!
//! Exposes two locations: a `POST` that stores the request body as a new
//! remote file and answers with its name, and a `GET`/`HEAD` that streams
//! a verified file back by `?tfsname=`. Transfers run on the blocking
//! pool; sessions come from a [`SessionPool`](tfsgate_client::SessionPool)
//! keyed by the configured name server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use state::{AppState, LevelSetter};

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use tfsgate_client::Connector;
use tower_http::trace::TraceLayer;

/// Builds the router for the configured put/get locations.
pub fn build_router<C>(state: Arc<AppState<C>>) -> Router
where
    C: Connector + 'static,
{
    let config = &state.config;
    let body_limit = config.max_body_size;
    let download = get(handlers::get_file::<C>).head(handlers::head_file::<C>);

    let files = if config.put_path == config.get_path {
        Router::new().route(&config.put_path, download.post(handlers::put_file::<C>))
    } else {
        Router::new()
            .route(&config.put_path, post(handlers::put_file::<C>))
            .route(&config.get_path, download)
    };

    files
        .route("/health", get(handlers::health))
        .route("/admin/log-level", put(handlers::set_log_level::<C>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
