use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, ErrorCode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// The signed-in user, resolved from a bearer access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            token_id: claims.jti,
        }
    }
}

/// HMAC secret used to sign and verify access tokens.
///
/// Handlers never see this directly; the `AuthUser` extractor pulls it out of
/// router state through `FromRef`.
#[derive(Clone)]
pub struct JwtSecret(String);

impl JwtSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.0.as_bytes()),
        )
        .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.0.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired, "token has expired")
            }
            _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
        })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(..)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_claims() {
        let secret = JwtSecret::new("test-secret");
        let user_id = Uuid::new_v4();
        let token = secret.encode(&Claims::new(user_id, 60)).unwrap();

        let claims = secret.decode(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
        assert!(!claims.is_expired());
    }

    #[test]
    fn bad_secret_rejects() {
        let token = JwtSecret::new("secret-a").encode(&Claims::new(Uuid::new_v4(), 60)).unwrap();
        let err = JwtSecret::new("secret-b").decode(&token).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let secret = JwtSecret::new("test-secret");
        let token = secret.encode(&Claims::new(Uuid::new_v4(), -120)).unwrap();
        let err = secret.decode(&token).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenExpired);
    }

    #[test]
    fn garbage_is_invalid() {
        let err = JwtSecret::new("s").decode("not.a.jwt").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        assert_eq!(format!("{:?}", JwtSecret::new("hunter2")), "JwtSecret(..)");
    }
}
