//! Haggle API Server library
//!
//! HTTP surface over the negotiation engine in `haggle-core`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use config::{CorsConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use state::AppState;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Assemble the full router for `state`
pub fn build_router(state: AppState) -> ServerResult<Router> {
    let cors = state.config.cors.layer()?;

    Ok(Router::new()
        .nest(
            &format!("/api/{}", haggle_api::API_VERSION),
            handlers::routes(state.clone()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the Haggle API server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    use std::net::SocketAddr;

    tracing::info!("Starting Haggle API Server on {}", config.bind_address);

    // Parse address before doing any connection work
    let addr: SocketAddr = config.bind_address.parse()?;

    let state = AppState::new(config).await?;
    let app = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
