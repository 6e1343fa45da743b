use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use spark_shared::errors::{AppError, AppResult, ErrorCode};
use spark_shared::types::auth::TokenPair;
use spark_shared::types::ApiResponse;

use crate::services::token_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Swaps a live refresh token for a fresh pair. The presented token is revoked.
pub async fn refresh_session(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    if req.refresh_token.trim().is_empty() {
        return Err(AppError::new(ErrorCode::TokenInvalid, "invalid refresh token"));
    }

    let mut conn = state.conn()?;

    let token_pair = token_service::rotate_session(&mut conn, &req.refresh_token, &state.config)?;

    Ok(Json(ApiResponse::ok(token_pair)))
}
