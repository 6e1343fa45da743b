use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spark_shared::errors::{AppError, AppResult};
use spark_shared::types::auth::AuthUser;
use spark_shared::types::ApiResponse;

use crate::models::{ProfileChangeset, User};
use crate::schema::users;
use crate::services::{match_service, profile_service, validation};
use crate::AppState;

// --- Views ---

/// The signed-in user's own profile.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: String,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub users_gender: Option<String>,
    pub interested_in_gender: Option<String>,
    pub profession: Option<String>,
    pub about: Option<String>,
    pub profile_photo: Option<String>,
    pub matches: Vec<Uuid>,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl MeResponse {
    pub fn new(user: User, today: NaiveDate) -> Self {
        let profile_complete = profile_service::is_profile_complete(&user);
        Self {
            id: user.id,
            email: user.email,
            date_of_birth: user
                .date_of_birth
                .map(profile_service::format_birth_date)
                .unwrap_or_default(),
            age: user.date_of_birth.map(|d| profile_service::calculate_age(d, today)),
            first_name: user.first_name,
            last_name: user.last_name,
            city: user.city,
            state: user.state,
            users_gender: user.users_gender,
            interested_in_gender: user.interested_in_gender,
            profession: user.profession,
            about: user.about,
            profile_photo: user.profile_photo,
            matches: user.matches,
            profile_complete,
            created_at: user.created_at,
        }
    }
}

/// A card in the swipe feed.
#[derive(Debug, Serialize)]
pub struct FeedCard {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: String,
    pub age: Option<i32>,
    pub about: Option<String>,
    pub profile_photo: Option<String>,
}

impl FeedCard {
    pub fn new(user: User, today: NaiveDate) -> Self {
        Self {
            id: user.id,
            date_of_birth: user
                .date_of_birth
                .map(profile_service::format_birth_date)
                .unwrap_or_default(),
            age: user.date_of_birth.map(|d| profile_service::calculate_age(d, today)),
            first_name: user.first_name,
            last_name: user.last_name,
            about: user.about,
            profile_photo: user.profile_photo,
        }
    }
}

/// A mutual match: the feed card plus profession.
#[derive(Debug, Serialize)]
pub struct MatchCard {
    #[serde(flatten)]
    pub card: FeedCard,
    pub profession: Option<String>,
}

impl MatchCard {
    pub fn new(mut user: User, today: NaiveDate) -> Self {
        let profession = user.profession.take();
        Self {
            card: FeedCard::new(user, today),
            profession,
        }
    }
}

// --- GET /users/me ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let mut conn = state.conn()?;
    let me = profile_service::find_user(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(MeResponse::new(me, Utc::now().date_naive()))))
}

// --- PUT /users/me ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub users_gender: Option<String>,
    pub interested_in_gender: Option<String>,
    pub profession: Option<String>,
    pub about: Option<String>,
    pub profile_photo: Option<String>,
}

const GENDER_MESSAGE: &str = "Must be one of the predefined gender options.";
/// Column width of the short text fields on `users`.
pub const NAME_MAX_CHARS: usize = 100;

impl UpdateProfileRequest {
    /// Checks fields in form order and stops at the first failure.
    pub fn validate(&self, today: NaiveDate) -> AppResult<ProfileChangeset> {
        let first_name =
            validation::bounded_text(self.first_name.as_deref(), NAME_MAX_CHARS, "First Name is required.")?;
        let last_name =
            validation::bounded_text(self.last_name.as_deref(), NAME_MAX_CHARS, "Last Name is required.")?;
        let date = validation::date_shape(
            self.date_of_birth.as_deref(),
            "Date must be in the format of MM/DD/YYYY.",
        )?;
        let date_of_birth = validation::birth_date(&date, today)?;
        let city =
            validation::bounded_text(self.city.as_deref(), NAME_MAX_CHARS, "City is required.")?;
        let state =
            validation::bounded_text(self.state.as_deref(), NAME_MAX_CHARS, "State is required.")?;
        let users_gender = validation::gender(self.users_gender.as_deref(), GENDER_MESSAGE)?;
        let interested_in_gender = validation::gender(self.interested_in_gender.as_deref(), GENDER_MESSAGE)?;
        let profession = validation::bounded_text(
            self.profession.as_deref(),
            NAME_MAX_CHARS,
            "Profession information is required.",
        )?;
        let about = validation::required_text(self.about.as_deref(), "About me information is required.")?;
        let profile_photo = validation::optional_url(
            self.profile_photo.as_deref(),
            "Profile photo URL must be a valid URL",
        )?;

        Ok(ProfileChangeset {
            first_name: Some(first_name),
            last_name: Some(last_name),
            date_of_birth: Some(date_of_birth),
            city: Some(city),
            state: Some(state),
            users_gender: Some(users_gender.as_str().to_string()),
            interested_in_gender: Some(interested_in_gender.as_str().to_string()),
            profession: Some(profession),
            about: Some(about),
            profile_photo,
        })
    }
}

pub async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let today = Utc::now().date_naive();
    let changes = req.validate(today)?;

    let mut conn = state.conn()?;
    let updated: User = diesel::update(users::table.find(user.id))
        .set((&changes, users::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .optional()?
        .ok_or_else(AppError::user_not_found)?;

    tracing::info!(user_id = %updated.id, "profile updated");

    Ok(Json(ApiResponse::ok(MeResponse::new(updated, today))))
}

// --- GET /users/:id ---

pub async fn get_match_profile(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MatchCard>>> {
    let mut conn = state.conn()?;
    let (_, other) = match_service::require_mutual(
        &mut conn,
        user.id,
        id,
        "You can only view profiles of your matches.",
    )?;

    Ok(Json(ApiResponse::ok(MatchCard::new(other, Utc::now().date_naive()))))
}
