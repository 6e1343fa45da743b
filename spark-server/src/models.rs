use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{messages, sessions, users};

// --- Gender ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub const ALL: [Gender; 5] = [
        Gender::Male,
        Gender::Female,
        Gender::NonBinary,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "nonBinary",
            Gender::Other => "other",
            Gender::PreferNotToSay => "preferNotToSay",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("unknown gender: {s}"))
    }
}

// --- User ---

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub users_gender: Option<String>,
    pub interested_in_gender: Option<String>,
    pub profession: Option<String>,
    pub about: Option<String>,
    pub profile_photo: Option<String>,
    pub matches: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn gender(&self) -> Option<Gender> {
        self.users_gender.as_deref().and_then(|g| g.parse().ok())
    }

    pub fn interested_in(&self) -> Option<Gender> {
        self.interested_in_gender.as_deref().and_then(|g| g.parse().ok())
    }

    pub fn has_matched(&self, other_id: Uuid) -> bool {
        self.matches.contains(&other_id)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub users_gender: Option<String>,
    pub interested_in_gender: Option<String>,
    pub about: Option<String>,
}

/// Editable profile fields. `profile_photo: None` leaves the stored photo untouched.
#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = users)]
pub struct ProfileChangeset {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub users_gender: Option<String>,
    pub interested_in_gender: Option<String>,
    pub profession: Option<String>,
    pub about: Option<String>,
    pub profile_photo: Option<String>,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
}

// --- Sessions ---

#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = sessions)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
