use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use uuid::Uuid;

use spark_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::User;
use crate::schema::users;
use crate::services::profile_service;

/// Appends `target` unless already present. Returns whether the list changed.
pub fn push_match(matches: &mut Vec<Uuid>, target: Uuid) -> bool {
    if matches.contains(&target) {
        return false;
    }
    matches.push(target);
    true
}

/// Drops every occurrence of `target`. Returns whether the list changed.
pub fn remove_match(matches: &mut Vec<Uuid>, target: Uuid) -> bool {
    let before = matches.len();
    matches.retain(|id| *id != target);
    matches.len() != before
}

/// Both users have each other in their match lists.
pub fn is_mutual(a: &User, b: &User) -> bool {
    a.id != b.id && a.has_matched(b.id) && b.has_matched(a.id)
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub matches: Vec<Uuid>,
    pub is_mutual: bool,
}

/// Records that `user_id` wants to match with `target_id`.
///
/// The caller's row is locked for the read-modify-write so concurrent likes
/// from the same account cannot drop each other's entries.
pub fn add_match(conn: &mut PgConnection, user_id: Uuid, target_id: Uuid) -> AppResult<MatchOutcome> {
    if user_id == target_id {
        return Err(AppError::new(ErrorCode::CannotMatchSelf, "you cannot match with yourself"));
    }

    conn.transaction::<_, AppError, _>(|conn| {
        let mut me: User = users::table
            .find(user_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(AppError::user_not_found)?;

        let target = profile_service::find_user(conn, target_id)?;

        if push_match(&mut me.matches, target.id) {
            diesel::update(users::table.find(me.id))
                .set(users::matches.eq(&me.matches))
                .execute(conn)?;
            tracing::info!(user_id = %me.id, target_id = %target.id, "match added");
        }

        Ok(MatchOutcome {
            is_mutual: is_mutual(&me, &target),
            matches: me.matches,
        })
    })
}

/// Removes `target_id` from the caller's list, which also ends any mutual match.
pub fn unmatch(conn: &mut PgConnection, user_id: Uuid, target_id: Uuid) -> AppResult<Vec<Uuid>> {
    conn.transaction::<_, AppError, _>(|conn| {
        let mut me: User = users::table
            .find(user_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(AppError::user_not_found)?;

        if !remove_match(&mut me.matches, target_id) {
            return Err(AppError::new(ErrorCode::MatchNotFound, "user is not in your matches"));
        }

        diesel::update(users::table.find(me.id))
            .set(users::matches.eq(&me.matches))
            .execute(conn)?;
        tracing::info!(user_id = %me.id, target_id = %target_id, "match removed");

        Ok(me.matches)
    })
}

fn mutual_query(me: &User) -> users::BoxedQuery<'static, Pg> {
    users::table
        .filter(users::id.eq_any(me.matches.clone()))
        .filter(users::matches.contains(vec![me.id]))
        .order(users::first_name.asc())
        .into_boxed()
}

/// Users the caller matched who matched the caller back.
pub fn mutual_matches(conn: &mut PgConnection, me: &User) -> AppResult<Vec<User>> {
    if me.matches.is_empty() {
        return Ok(vec![]);
    }

    let matched = mutual_query(me).load::<User>(conn)?;
    Ok(matched)
}

/// Fails with `NotMatched` unless `other_id` is in the caller's own list.
pub fn ensure_listed(me: &User, other_id: Uuid, message: &str) -> AppResult<()> {
    if me.id == other_id || !me.has_matched(other_id) {
        return Err(AppError::new(ErrorCode::NotMatched, message));
    }
    Ok(())
}

/// Loads both users and fails with `NotMatched` unless the match is mutual.
///
/// The caller's list is checked before the other user is loaded, so ids the
/// caller never matched are refused without revealing whether they exist.
pub fn require_mutual(
    conn: &mut PgConnection,
    user_id: Uuid,
    other_id: Uuid,
    message: &str,
) -> AppResult<(User, User)> {
    let me = profile_service::find_user(conn, user_id)?;
    ensure_listed(&me, other_id, message)?;

    let other = profile_service::find_user(conn, other_id)?;
    if !is_mutual(&me, &other) {
        return Err(AppError::new(ErrorCode::NotMatched, message));
    }
    Ok((me, other))
}
