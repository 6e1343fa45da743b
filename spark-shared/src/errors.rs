use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: User/profile errors
/// - E3xxx: Matching errors
/// - E4xxx: Messaging errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    ServiceUnavailable,
    BadRequest,

    // Auth (E1xxx)
    InvalidCredentials,
    EmailAlreadyExists,
    TokenExpired,
    TokenInvalid,

    // User (E2xxx)
    UserNotFound,
    InvalidDateOfBirth,
    ProfileIncomplete,

    // Matching (E3xxx)
    CannotMatchSelf,
    MatchNotFound,
    NotMatched,

    // Messaging (E4xxx)
    MissingMessageFields,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::EmailAlreadyExists => "E1002",
            Self::TokenExpired => "E1004",
            Self::TokenInvalid => "E1005",

            // User
            Self::UserNotFound => "E2001",
            Self::InvalidDateOfBirth => "E2002",
            Self::ProfileIncomplete => "E2003",

            // Matching
            Self::CannotMatchSelf => "E3001",
            Self::MatchNotFound => "E3002",
            Self::NotMatched => "E3003",

            // Messaging
            Self::MissingMessageFields => "E4001",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationError | Self::BadRequest | Self::InvalidDateOfBirth
            | Self::CannotMatchSelf | Self::MissingMessageFields => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::UserNotFound | Self::MatchNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::ProfileIncomplete | Self::NotMatched => StatusCode::FORBIDDEN,
            Self::EmailAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn user_not_found() -> Self {
        Self::new(ErrorCode::UserNotFound, "User not found.")
    }

    /// The error code this error renders with.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) => ErrorCode::InternalError,
            AppError::Database(diesel::result::Error::NotFound) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
            AppError::Validation(_) => ErrorCode::ValidationError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn known_error_envelope() {
        let value = body_json(AppError::new(ErrorCode::EmailAlreadyExists, "Email already in use.")).await;

        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "E1002");
        assert_eq!(value["error"]["message"], "Email already in use.");
        assert!(value["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn details_are_rendered() {
        let err = AppError::with_details(
            ErrorCode::ValidationError,
            "bad field",
            serde_json::json!({ "field": "first_name" }),
        );
        let value = body_json(err).await;
        assert_eq!(value["error"]["details"]["field"], "first_name");
    }

    #[tokio::test]
    async fn database_not_found_is_404() {
        let response = AppError::Database(diesel::result::Error::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_error_hides_cause() {
        let err = AppError::Internal(anyhow::anyhow!("connection reset by peer"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let value = body_json(AppError::Internal(anyhow::anyhow!("connection reset by peer"))).await;
        assert_eq!(value["error"]["message"], "internal server error");
    }

    #[test]
    fn status_codes_by_area() {
        assert_eq!(ErrorCode::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ProfileIncomplete.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotMatched.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::MatchNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::CannotMatchSelf.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn code_of_validation_variant() {
        assert_eq!(AppError::Validation("x".into()).code(), ErrorCode::ValidationError);
        assert_eq!(AppError::user_not_found().code(), ErrorCode::UserNotFound);
    }
}
