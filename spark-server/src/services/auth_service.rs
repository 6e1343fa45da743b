use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use spark_shared::errors::{AppError, AppResult, ErrorCode};
use spark_shared::types::auth::TokenPair;

use crate::config::AppConfig;
use crate::models::{NewUser, User};
use crate::schema::users;
use crate::services::token_service;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Normalised form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn email_taken() -> AppError {
    AppError::new(ErrorCode::EmailAlreadyExists, "Email already in use.")
}

/// Inserts the user and signs them in. Either both rows land or neither does.
pub fn create_account(
    conn: &mut PgConnection,
    new_user: &NewUser,
    config: &AppConfig,
) -> AppResult<(User, TokenPair)> {
    create_account_with(conn, new_user, |conn, user_id| {
        token_service::open_session(conn, user_id, config)
    })
}

/// [`create_account`] with the session step supplied by the caller.
pub fn create_account_with<F>(
    conn: &mut PgConnection,
    new_user: &NewUser,
    open_session: F,
) -> AppResult<(User, TokenPair)>
where
    F: FnOnce(&mut PgConnection, Uuid) -> AppResult<TokenPair>,
{
    conn.transaction::<_, AppError, _>(|conn| {
        let user: User = diesel::insert_into(users::table)
            .values(new_user)
            .get_result(conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => email_taken(),
                other => AppError::from(other),
            })?;

        let tokens = open_session(conn, user.id)?;
        Ok((user, tokens))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[test]
    fn taken_email_is_a_conflict() {
        let err = email_taken();
        assert_eq!(err.code(), ErrorCode::EmailAlreadyExists);
        assert_eq!(err.to_string(), "Email already in use.");
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Mike123@Gmail.COM "), "mike123@gmail.com");
    }
}
