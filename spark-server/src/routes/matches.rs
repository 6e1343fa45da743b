use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spark_shared::errors::{AppError, AppResult, ErrorCode};
use spark_shared::types::auth::AuthUser;
use spark_shared::types::ApiResponse;

use crate::routes::profile::MatchCard;
use crate::services::{match_service, profile_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddMatchRequest {
    pub match_user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<Uuid>,
    pub is_mutual: bool,
}

#[derive(Debug, Serialize)]
pub struct UnmatchResponse {
    pub matches: Vec<Uuid>,
}

// --- GET /users/me/matches ---

pub async fn list_matches(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<MatchCard>>>> {
    let mut conn = state.conn()?;
    let me = profile_service::find_user(&mut conn, user.id)?;

    let today = Utc::now().date_naive();
    let cards = match_service::mutual_matches(&mut conn, &me)?
        .into_iter()
        .map(|u| MatchCard::new(u, today))
        .collect();

    Ok(Json(ApiResponse::ok(cards)))
}

// --- POST /users/me/matches ---

pub async fn add_match(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AddMatchRequest>,
) -> AppResult<Json<ApiResponse<MatchResponse>>> {
    let target_id = req
        .match_user_id
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "match_user_id is required"))?;
    if target_id == user.id {
        return Err(AppError::new(ErrorCode::CannotMatchSelf, "you cannot match with yourself"));
    }

    let mut conn = state.conn()?;
    let outcome = match_service::add_match(&mut conn, user.id, target_id)?;

    if outcome.is_mutual {
        tracing::info!(user_id = %user.id, target_id = %target_id, "mutual match");
    }

    Ok(Json(ApiResponse::ok(MatchResponse {
        matches: outcome.matches,
        is_mutual: outcome.is_mutual,
    })))
}

// --- DELETE /users/me/matches/:id ---

pub async fn unmatch(
    user: AuthUser,
    State(state): State<AppState>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UnmatchResponse>>> {
    let mut conn = state.conn()?;
    let matches = match_service::unmatch(&mut conn, user.id, target_id)?;

    Ok(Json(ApiResponse::ok(UnmatchResponse { matches })))
}
