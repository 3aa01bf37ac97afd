//! Voice call endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use haggle_api::{
    ApiError,
    requests::{EndVoiceRequest, StartVoiceRequest},
    responses::VoiceSessionResponse,
};
use haggle_core::{UserId, VoiceSessionId};

use crate::state::AppState;

pub async fn start_voice(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    WithRejection(Json(request), _): WithRejection<Json<StartVoiceRequest>, ApiError>,
) -> Result<Json<VoiceSessionResponse>, ApiError> {
    let session = state
        .manager
        .start_voice(&user_id, &request.product_id)
        .await?;
    Ok(Json(session.into()))
}

pub async fn end_voice(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    WithRejection(Path(session_id), _): WithRejection<Path<VoiceSessionId>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<EndVoiceRequest>, ApiError>,
) -> Result<Json<VoiceSessionResponse>, ApiError> {
    let session = state
        .manager
        .end_voice(&user_id, &session_id, request.duration)
        .await?;
    Ok(Json(session.into()))
}

pub async fn voice_history(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<VoiceSessionResponse>>, ApiError> {
    let sessions = state.manager.voice_history(&user_id).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}
