//! Field rules shared by the registration and profile forms.
//!
//! Each rule returns the trimmed value or a `ValidationError` carrying the
//! caller-supplied message, so a request validator can stop at the first
//! failing field.

use chrono::NaiveDate;

use spark_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::Gender;
use crate::services::profile_service;

pub fn required_text(value: Option<&str>, message: &str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::new(ErrorCode::ValidationError, message)),
    }
}

/// Like [`required_text`], also rejecting values longer than `max_chars`.
pub fn bounded_text(value: Option<&str>, max_chars: usize, message: &str) -> AppResult<String> {
    let value = required_text(value, message)?;
    if value.chars().count() > max_chars {
        return Err(AppError::new(ErrorCode::ValidationError, message));
    }
    Ok(value)
}

pub fn email(value: Option<&str>, message: &str) -> AppResult<String> {
    let value = required_text(value, message)?;
    if !validator::validate_email(value.as_str()) {
        return Err(AppError::new(ErrorCode::ValidationError, message));
    }
    Ok(value)
}

/// Passwords are taken verbatim; only emptiness is rejected.
pub fn password(value: Option<&str>, message: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::new(ErrorCode::ValidationError, message)),
    }
}

pub fn gender(value: Option<&str>, message: &str) -> AppResult<Gender> {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<Gender>().ok())
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, message))
}

/// Checks the `MM/DD/YYYY` shape only; use [`birth_date`] for calendar validity.
pub fn date_shape(value: Option<&str>, message: &str) -> AppResult<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if !profile_service::is_date_shaped(value) {
        return Err(AppError::new(ErrorCode::ValidationError, message));
    }
    Ok(value.to_string())
}

/// Parses an already shape-checked date and rejects impossible or future dates.
pub fn birth_date(value: &str, today: NaiveDate) -> AppResult<NaiveDate> {
    let date = profile_service::parse_birth_date(value)
        .ok_or_else(|| AppError::new(ErrorCode::InvalidDateOfBirth, "Invalid date format."))?;
    if date > today {
        return Err(AppError::new(
            ErrorCode::InvalidDateOfBirth,
            "Date of birth cannot be in the future.",
        ));
    }
    Ok(date)
}

pub fn optional_url(value: Option<&str>, message: &str) -> AppResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if validator::validate_url(v) => Ok(Some(v.to_string())),
        Some(_) => Err(AppError::new(ErrorCode::ValidationError, message)),
    }
}
