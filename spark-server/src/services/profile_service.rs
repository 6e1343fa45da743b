use chrono::{Datelike, NaiveDate};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use spark_shared::errors::{AppError, AppResult};

use crate::models::User;
use crate::schema::users;

const DATE_FORMAT: &str = "%m/%d/%Y";

/// True for `MM/DD/YYYY`: two digits, slash, two digits, slash, four digits.
pub fn is_date_shaped(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[2] == b'/'
        && bytes[5] == b'/'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit())
}

pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    if !is_date_shaped(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn format_birth_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Whole years since `birth`, not counting a birthday that is still ahead this year.
pub fn calculate_age(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Everything a card in someone else's feed needs, including the photo.
pub fn is_profile_complete(user: &User) -> bool {
    let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    filled(&user.first_name)
        && filled(&user.last_name)
        && user.date_of_birth.is_some()
        && user.gender().is_some()
        && user.interested_in().is_some()
        && filled(&user.profession)
        && filled(&user.about)
        && filled(&user.profile_photo)
}

pub fn find_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    users::table
        .find(user_id)
        .first::<User>(conn)
        .optional()?
        .ok_or_else(AppError::user_not_found)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_shape() {
        assert!(is_date_shaped("12/31/1999"));
        assert!(!is_date_shaped("12-31-1999"));
        assert!(!is_date_shaped("2/3/1999"));
        assert!(!is_date_shaped("12/31/99"));
        assert!(!is_date_shaped("ab/cd/efgh"));
    }

    #[test]
    fn parse_is_month_first() {
        assert_eq!(parse_birth_date("03/04/1995"), Some(ymd(1995, 3, 4)));
        assert_eq!(parse_birth_date("13/01/1995"), None);
        assert_eq!(parse_birth_date("02/29/2001"), None);
    }

    #[test]
    fn format_pads_with_zeros() {
        assert_eq!(format_birth_date(ymd(1995, 3, 4)), "03/04/1995");
    }

    #[test]
    fn age_before_and_after_birthday() {
        let birth = ymd(1990, 6, 15);
        assert_eq!(calculate_age(birth, ymd(2024, 6, 14)), 33);
        assert_eq!(calculate_age(birth, ymd(2024, 6, 15)), 34);
        assert_eq!(calculate_age(birth, ymd(2024, 12, 1)), 34);
        assert_eq!(calculate_age(birth, ymd(2024, 1, 1)), 33);
    }

    #[test]
    fn age_for_leap_day_birth() {
        let birth = ymd(2000, 2, 29);
        assert_eq!(calculate_age(birth, ymd(2023, 2, 28)), 22);
        assert_eq!(calculate_age(birth, ymd(2023, 3, 1)), 23);
    }

    #[test]
    fn complete_profile_needs_photo_and_profession() {
        let mut user = fixtures::user(Gender::Female, Gender::Male);
        assert!(is_profile_complete(&user));

        user.profile_photo = None;
        assert!(!is_profile_complete(&user));

        let mut user = fixtures::user(Gender::Female, Gender::Male);
        user.profession = Some("  ".into());
        assert!(!is_profile_complete(&user));
    }

    #[test]
    fn unknown_gender_value_is_incomplete() {
        let mut user = fixtures::user(Gender::Female, Gender::Male);
        user.users_gender = Some("robot".into());
        assert!(!is_profile_complete(&user));
    }
}
