use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthUser, JwtSecret};

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = JwtSecret::from_ref(state).decode(token)?;

        if claims.is_expired() {
            return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
        }

        Ok(AuthUser::from(claims))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "authorization header must use Bearer scheme"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::auth::Claims;
    use axum::http::Request;
    use uuid::Uuid;

    #[derive(Clone)]
    struct TestState {
        secret: JwtSecret,
    }

    impl FromRef<TestState> for JwtSecret {
        fn from_ref(state: &TestState) -> Self {
            state.secret.clone()
        }
    }

    fn state() -> TestState {
        TestState { secret: JwtSecret::new("extractor-secret") }
    }

    async fn extract(auth: Option<&str>) -> Result<AuthUser, AppError> {
        let mut builder = Request::builder().uri("/users/me");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &state()).await
    }

    #[tokio::test]
    async fn accepts_valid_bearer_token() {
        let user_id = Uuid::new_v4();
        let token = state().secret.encode(&Claims::new(user_id, 300)).unwrap();

        let user = extract(Some(&format!("Bearer {token}"))).await.unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let err = extract(Some("Basic dXNlcjpwYXNz")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        let err = extract(Some("Bearer ")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn foreign_token_is_invalid() {
        let token = JwtSecret::new("other").encode(&Claims::new(Uuid::new_v4(), 300)).unwrap();
        let err = extract(Some(&format!("Bearer {token}"))).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::TokenInvalid);
    }
}
