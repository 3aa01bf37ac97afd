//! Negotiation endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use haggle_api::{
    ApiError,
    requests::{EndNegotiationRequest, SendMessageRequest, StartNegotiationRequest},
    responses::SessionResponse,
};
use haggle_core::{SessionId, UserId};

use crate::state::AppState;

pub async fn start_negotiation(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    WithRejection(Json(request), _): WithRejection<Json<StartNegotiationRequest>, ApiError>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .manager
        .start_negotiation(
            &user_id,
            &request.product_id,
            &request.initial_offer.to_text(),
        )
        .await?;

    Ok(Json(session.into()))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    WithRejection(Path(session_id), _): WithRejection<Path<SessionId>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .manager
        .submit_message(&user_id, &session_id, &request.content)
        .await?;

    Ok(Json(session.into()))
}

pub async fn end_negotiation(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    WithRejection(Path(session_id), _): WithRejection<Path<SessionId>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<EndNegotiationRequest>, ApiError>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .manager
        .end_negotiation(&user_id, &session_id, request.final_price)
        .await?;

    Ok(Json(session.into()))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let sessions = state.manager.list_history(&user_id).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}
