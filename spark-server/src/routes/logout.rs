use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;

use spark_shared::errors::AppResult;
use spark_shared::types::ApiResponse;

use crate::schema::sessions;
use crate::services::token_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Revokes the session behind `refresh_token`. Unknown or already revoked tokens are a no-op.
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> AppResult<Json<ApiResponse<&'static str>>> {
    if req.refresh_token.trim().is_empty() {
        return Ok(Json(ApiResponse::ok("logged out")));
    }

    let token_hash = token_service::hash_token(&req.refresh_token);
    let mut conn = state.conn()?;

    let revoked = diesel::update(
        sessions::table
            .filter(sessions::token_hash.eq(&token_hash))
            .filter(sessions::revoked_at.is_null()),
    )
    .set(sessions::revoked_at.eq(Some(chrono::Utc::now())))
    .execute(&mut conn)?;

    tracing::debug!(revoked, "logout");

    Ok(Json(ApiResponse::ok("logged out")))
}
