//! Middleware for authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use haggle_api::ApiError;

use crate::state::AppState;

/// Authentication middleware
///
/// Resolves the bearer token to a `UserId` and stores it in the request
/// extensions for handlers to pick up.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    let claims = crate::auth::validate_access_token(bearer.token(), &state.jwt_decoding_key)
        .map_err(|e| {
            tracing::debug!("rejected bearer token: {}", e);
            ApiError::unauthorized("Invalid or expired token")
        })?;

    request.extensions_mut().insert(claims.sub);

    Ok(next.run(request).await)
}
