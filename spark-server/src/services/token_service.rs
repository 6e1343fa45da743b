use chrono::{DateTime, Duration, Utc};
use diesel::dsl;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use spark_shared::errors::{AppError, AppResult, ErrorCode};
use spark_shared::types::auth::{Claims, JwtSecret, TokenPair};

use crate::config::AppConfig;
use crate::models::{NewSession, Session};
use crate::schema::sessions;

pub fn create_access_token(user_id: Uuid, secret: &JwtSecret, ttl_secs: i64) -> Result<String, AppError> {
    secret.encode(&Claims::new(user_id, ttl_secs))
}

pub fn create_refresh_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn create_token_pair(
    user_id: Uuid,
    secret: &JwtSecret,
    access_ttl: i64,
) -> Result<(TokenPair, String), AppError> {
    let access_token = create_access_token(user_id, secret, access_ttl)?;
    let refresh_token = create_refresh_token();
    let refresh_hash = hash_token(&refresh_token);
    let pair = TokenPair::new(access_token, refresh_token, access_ttl);
    Ok((pair, refresh_hash))
}

/// Opens a new session for `user_id`: issues a token pair and stores the refresh hash.
pub fn open_session(conn: &mut PgConnection, user_id: Uuid, config: &AppConfig) -> AppResult<TokenPair> {
    let secret = JwtSecret::new(config.jwt_secret.clone());
    let (token_pair, refresh_hash) = create_token_pair(user_id, &secret, config.jwt_access_ttl)?;

    let new_session = NewSession {
        user_id,
        token_hash: refresh_hash,
        expires_at: Utc::now() + Duration::seconds(config.jwt_refresh_ttl),
    };
    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(token_pair)
}

type SessionLookup = dsl::ForUpdate<dsl::Filter<sessions::table, dsl::Eq<sessions::token_hash, String>>>;

/// Row-locking lookup by refresh-token hash. Concurrent rotations of one token
/// queue on the lock and see the first one's revocation.
fn session_lookup(token_hash: String) -> SessionLookup {
    sessions::table
        .filter(sessions::token_hash.eq(token_hash))
        .for_update()
}

fn invalid_refresh_token() -> AppError {
    AppError::new(ErrorCode::TokenInvalid, "invalid refresh token")
}

/// Revoked sessions are reported like unknown ones; expired ones get their own code.
pub fn ensure_live(session: &Session, now: DateTime<Utc>) -> AppResult<()> {
    if session.revoked_at.is_some() {
        return Err(invalid_refresh_token());
    }
    if session.expires_at < now {
        return Err(AppError::new(ErrorCode::TokenExpired, "refresh token expired"));
    }
    Ok(())
}

/// Looks up and locks a live session by its raw refresh token.
///
/// Call inside a transaction so the lock is held until the session is revoked.
pub fn find_live_session(conn: &mut PgConnection, refresh_token: &str) -> AppResult<Session> {
    let session: Session = session_lookup(hash_token(refresh_token))
        .first(conn)
        .optional()?
        .ok_or_else(invalid_refresh_token)?;

    ensure_live(&session, Utc::now())?;
    Ok(session)
}

/// Revokes a session that is still live. A session revoked in the meantime is
/// an invalid token, so one refresh token never yields two pairs.
pub fn revoke_session(conn: &mut PgConnection, session_id: Uuid) -> AppResult<()> {
    let revoked = diesel::update(
        sessions::table
            .find(session_id)
            .filter(sessions::revoked_at.is_null()),
    )
    .set(sessions::revoked_at.eq(Some(Utc::now())))
    .execute(conn)?;

    if revoked == 0 {
        return Err(invalid_refresh_token());
    }
    Ok(())
}

/// Revokes the session behind `refresh_token` and opens a new one, atomically.
pub fn rotate_session(
    conn: &mut PgConnection,
    refresh_token: &str,
    config: &AppConfig,
) -> AppResult<TokenPair> {
    conn.transaction::<_, AppError, _>(|conn| {
        let session = find_live_session(conn, refresh_token)?;
        revoke_session(conn, session.id)?;
        tracing::debug!(user_id = %session.user_id, session_id = %session.id, "refresh token rotated");
        open_session(conn, session.user_id, config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;
    use diesel::pg::Pg;

    fn session(expires_in: i64, revoked: bool) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: hash_token("t"),
            expires_at: now + Duration::seconds(expires_in),
            revoked_at: revoked.then_some(now),
            created_at: now,
        }
    }

    #[test]
    fn refresh_token_format() {
        let token = create_refresh_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, create_refresh_token());
    }

    #[test]
    fn token_hash_is_stable_sha256() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn token_pair_carries_user_and_hash() {
        let secret = JwtSecret::new("pair-secret");
        let user_id = Uuid::new_v4();
        let (pair, hash) = create_token_pair(user_id, &secret, 900).unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
        assert_eq!(hash, hash_token(&pair.refresh_token));
        assert_eq!(secret.decode(&pair.access_token).unwrap().sub, user_id);
    }

    #[test]
    fn revoked_session_is_an_invalid_token() {
        let err = ensure_live(&session(3600, true), Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
        assert_eq!(err.code().code(), "E1005");
    }

    #[test]
    fn expired_session_is_reported_as_expired() {
        let err = ensure_live(&session(-5, false), Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenExpired);

        assert!(ensure_live(&session(60, false), Utc::now()).is_ok());
    }

    #[test]
    fn session_lookup_locks_the_row() {
        let hash = hash_token("raw");
        let sql = debug_query::<Pg, _>(&session_lookup(hash.clone())).to_string();

        assert!(sql.contains(r#""sessions"."token_hash" = $1"#), "{sql}");
        assert!(sql.contains(" FOR UPDATE"), "{sql}");
        assert!(sql.contains(&hash), "{sql}");
    }
}
