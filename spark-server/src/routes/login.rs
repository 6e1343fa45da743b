use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;

use spark_shared::errors::{AppError, AppResult, ErrorCode};
use spark_shared::types::auth::TokenPair;
use spark_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::services::{auth_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn invalid_credentials() -> AppError {
    AppError::new(ErrorCode::InvalidCredentials, "invalid email or password")
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let email = auth_service::normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(invalid_credentials());
    }

    let mut conn = state.conn()?;

    let user: User = users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?
        .ok_or_else(invalid_credentials)?;

    if !auth_service::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(invalid_credentials());
    }

    let token_pair = token_service::open_session(&mut conn, user.id, &state.config)?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(token_pair)))
}
