use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use spark_shared::errors::AppResult;
use spark_shared::types::auth::TokenPair;
use spark_shared::types::ApiResponse;

use crate::models::NewUser;
use crate::routes::profile::{MeResponse, NAME_MAX_CHARS};
use crate::schema::users;
use crate::services::{auth_service, validation};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub users_gender: Option<String>,
    pub interested_in_gender: Option<String>,
    pub about: Option<String>,
}

/// A registration form that passed every field rule.
#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub users_gender: String,
    pub interested_in_gender: String,
    pub about: String,
}

impl RegisterRequest {
    pub fn validate(&self, today: NaiveDate) -> AppResult<Registration> {
        let email = validation::email(self.email.as_deref(), "Must be a valid email.")?;
        let password = validation::password(self.password.as_deref(), "Must be a valid password.")?;
        let first_name =
            validation::bounded_text(self.first_name.as_deref(), NAME_MAX_CHARS, "Must be a valid first name.")?;
        let last_name =
            validation::bounded_text(self.last_name.as_deref(), NAME_MAX_CHARS, "Must be a valid last name.")?;
        let date = validation::date_shape(
            self.date_of_birth.as_deref(),
            "Date must be in the format of MM/DD/YYYY.",
        )?;
        let date_of_birth = validation::birth_date(&date, today)?;
        let users_gender = validation::gender(
            self.users_gender.as_deref(),
            "Must be one of the predefined gender options.",
        )?;
        let interested_in_gender = validation::gender(
            self.interested_in_gender.as_deref(),
            "Must be one of the predefined gender options.",
        )?;
        let about = validation::required_text(self.about.as_deref(), "Must be valid about me information.")?;

        Ok(Registration {
            email: auth_service::normalize_email(&email),
            password,
            first_name,
            last_name,
            date_of_birth,
            users_gender: users_gender.as_str().to_string(),
            interested_in_gender: interested_in_gender.as_str().to_string(),
            about,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: MeResponse,
    pub tokens: TokenPair,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    let today = Utc::now().date_naive();
    let form = req.validate(today)?;

    let mut conn = state.conn()?;

    let exists: i64 = users::table
        .filter(users::email.eq(&form.email))
        .count()
        .get_result(&mut conn)?;
    if exists > 0 {
        return Err(auth_service::email_taken());
    }

    let new_user = NewUser {
        password_hash: auth_service::hash_password(&form.password)?,
        email: form.email,
        first_name: Some(form.first_name),
        last_name: Some(form.last_name),
        date_of_birth: Some(form.date_of_birth),
        users_gender: Some(form.users_gender),
        interested_in_gender: Some(form.interested_in_gender),
        about: Some(form.about),
    };

    let (user, tokens) = auth_service::create_account(&mut conn, &new_user, &state.config)?;

    tracing::info!(user_id = %user.id, email = %user.email, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(RegisterResponse {
            user: MeResponse::new(user, today),
            tokens,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_shared::errors::ErrorCode;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn filled() -> RegisterRequest {
        RegisterRequest {
            email: Some("  Mike123@Gmail.com ".into()),
            password: Some("hunter2".into()),
            first_name: Some("Mike".into()),
            last_name: Some("Jones".into()),
            date_of_birth: Some("04/01/1992".into()),
            users_gender: Some("male".into()),
            interested_in_gender: Some("female".into()),
            about: Some("Climbing and coffee".into()),
        }
    }

    fn message(req: RegisterRequest) -> String {
        req.validate(today()).unwrap_err().to_string()
    }

    #[test]
    fn valid_form_is_normalised() {
        let form = filled().validate(today()).unwrap();
        assert_eq!(form.email, "mike123@gmail.com");
        assert_eq!(form.date_of_birth, NaiveDate::from_ymd_opt(1992, 4, 1).unwrap());
        assert_eq!(form.users_gender, "male");
    }

    #[test]
    fn messages_follow_field_order() {
        assert_eq!(message(RegisterRequest::default()), "Must be a valid email.");
        assert_eq!(
            message(RegisterRequest { password: Some(String::new()), ..filled() }),
            "Must be a valid password."
        );
        assert_eq!(
            message(RegisterRequest { first_name: None, last_name: None, ..filled() }),
            "Must be a valid first name."
        );
        assert_eq!(
            message(RegisterRequest { last_name: Some(" ".into()), ..filled() }),
            "Must be a valid last name."
        );
        assert_eq!(
            message(RegisterRequest { date_of_birth: Some("4/1/1992".into()), ..filled() }),
            "Date must be in the format of MM/DD/YYYY."
        );
        assert_eq!(
            message(RegisterRequest { users_gender: Some("man".into()), ..filled() }),
            "Must be one of the predefined gender options."
        );
        assert_eq!(
            message(RegisterRequest { about: None, ..filled() }),
            "Must be valid about me information."
        );
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let err = RegisterRequest { date_of_birth: Some("12/31/2099".into()), ..filled() }
            .validate(today())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDateOfBirth);
    }
}
