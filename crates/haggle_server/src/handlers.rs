//! HTTP request handlers

use axum::{
    Router, middleware,
    routing::{get, post},
};

pub mod health;
pub mod negotiation;
pub mod voice;

use crate::{middleware::require_auth, state::AppState};

/// Build all API routes
///
/// Everything except the health check sits behind the bearer-token guard.
pub fn routes(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/negotiate", post(negotiation::start_negotiation))
        .route(
            "/negotiate/:session_id/message",
            post(negotiation::send_message),
        )
        .route("/negotiate/:session_id/end", post(negotiation::end_negotiation))
        .route("/history", get(negotiation::history))
        .route("/voice/start", post(voice::start_voice))
        .route("/voice/:session_id/end", post(voice::end_voice))
        .route("/voice/history", get(voice::voice_history))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(authenticated)
}
