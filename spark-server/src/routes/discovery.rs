use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;

use spark_shared::errors::{AppError, AppResult, ErrorCode};
use spark_shared::types::auth::AuthUser;
use spark_shared::types::pagination::{Paginated, PaginationParams};
use spark_shared::types::ApiResponse;

use crate::routes::profile::FeedCard;
use crate::services::discovery_service::{self, DiscoveryCriteria};
use crate::services::profile_service;
use crate::AppState;

// --- GET /users ---

pub async fn discover_users(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<FeedCard>>>> {
    let params = params.capped(state.config.discovery_page_size);
    let mut conn = state.conn()?;

    let me = profile_service::find_user(&mut conn, user.id)?;
    if !profile_service::is_profile_complete(&me) {
        return Err(AppError::new(
            ErrorCode::ProfileIncomplete,
            "Complete your profile to start matching.",
        ));
    }

    let Some(criteria) = DiscoveryCriteria::for_user(&me) else {
        return Ok(Json(ApiResponse::ok(Paginated::new(vec![], 0, &params))));
    };

    let (candidates, total) = discovery_service::find_candidates(&mut conn, &criteria, &params)?;

    let today = Utc::now().date_naive();
    let cards = candidates
        .into_iter()
        .map(|u| FeedCard::new(u, today))
        .collect();

    Ok(Json(ApiResponse::ok(Paginated::new(cards, total.max(0) as u64, &params))))
}
