use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use uuid::Uuid;

use spark_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Message, NewMessage};
use crate::schema::messages;

/// Parses the raw `{match_id, content}` pair of a send request.
///
/// A missing id or blank content is a `MissingMessageFields` error. Content is
/// stored as sent.
pub fn parse_outgoing(match_id: Option<&str>, content: Option<&str>) -> AppResult<(Uuid, String)> {
    let missing = || AppError::new(ErrorCode::MissingMessageFields, "Missing required fields");

    let match_id = match_id.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(missing)?;
    let content = content.filter(|c| !c.trim().is_empty()).ok_or_else(missing)?;

    let match_id = Uuid::parse_str(match_id)
        .map_err(|_| AppError::bad_request("match_id must be a valid id"))?;

    Ok((match_id, content.to_string()))
}

pub fn send(conn: &mut PgConnection, sender_id: Uuid, recipient_id: Uuid, content: String) -> AppResult<Message> {
    let message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            sender_id,
            recipient_id,
            content,
        })
        .get_result::<Message>(conn)?;

    tracing::info!(
        message_id = %message.id,
        sender_id = %sender_id,
        recipient_id = %recipient_id,
        "message sent"
    );

    Ok(message)
}

fn conversation_query(user_a: Uuid, user_b: Uuid) -> messages::BoxedQuery<'static, Pg> {
    messages::table
        .filter(
            messages::sender_id
                .eq(user_a)
                .and(messages::recipient_id.eq(user_b))
                .or(messages::sender_id.eq(user_b).and(messages::recipient_id.eq(user_a))),
        )
        .order((messages::created_at.asc(), messages::id.asc()))
        .into_boxed()
}

/// Every message between the two users in either direction, oldest first.
pub fn conversation(conn: &mut PgConnection, user_a: Uuid, user_b: Uuid) -> AppResult<Vec<Message>> {
    let thread = conversation_query(user_a, user_b).load::<Message>(conn)?;
    Ok(thread)
}
