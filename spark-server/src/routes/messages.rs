use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use spark_shared::errors::AppResult;
use spark_shared::types::auth::AuthUser;
use spark_shared::types::ApiResponse;

use crate::models::Message;
use crate::services::{match_service, message_service};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    pub match_id: Option<String>,
    pub content: Option<String>,
}

// --- POST /messages ---

pub async fn send_message(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let (recipient_id, content) =
        message_service::parse_outgoing(req.match_id.as_deref(), req.content.as_deref())?;

    let mut conn = state.conn()?;
    match_service::require_mutual(
        &mut conn,
        user.id,
        recipient_id,
        "Not authorized to send messages to this user",
    )?;

    let message = message_service::send(&mut conn, user.id, recipient_id, content)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}

// --- GET /messages/:match_id ---

pub async fn list_conversation(
    user: AuthUser,
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Message>>>> {
    let mut conn = state.conn()?;
    match_service::require_mutual(
        &mut conn,
        user.id,
        match_id,
        "Not authorized to view messages with this user",
    )?;

    let thread = message_service::conversation(&mut conn, user.id, match_id)?;

    Ok(Json(ApiResponse::ok(thread)))
}
