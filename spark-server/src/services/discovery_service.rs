use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use uuid::Uuid;

use spark_shared::errors::AppResult;
use spark_shared::types::pagination::PaginationParams;

use crate::models::{Gender, User};
use crate::schema::users;

/// Who a seeker may be shown in the swipe feed.
///
/// A candidate qualifies when their own gender is what the seeker is
/// interested in, they are interested in the seeker's gender, their card has
/// every field filled in, and the seeker has not already matched them.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryCriteria {
    pub seeker_id: Uuid,
    pub seeker_gender: Gender,
    pub wanted_gender: Gender,
    pub excluded_ids: Vec<Uuid>,
}

impl DiscoveryCriteria {
    /// `None` when the seeker has not said who they are or who they want.
    pub fn for_user(seeker: &User) -> Option<Self> {
        let seeker_gender = seeker.gender()?;
        let wanted_gender = seeker.interested_in()?;

        let mut excluded_ids = Vec::with_capacity(seeker.matches.len() + 1);
        excluded_ids.push(seeker.id);
        for id in &seeker.matches {
            if !excluded_ids.contains(id) {
                excluded_ids.push(*id);
            }
        }

        Some(Self {
            seeker_id: seeker.id,
            seeker_gender,
            wanted_gender,
            excluded_ids,
        })
    }

    pub(crate) fn query(&self) -> users::BoxedQuery<'static, Pg> {
        users::table
            .filter(users::id.ne_all(self.excluded_ids.clone()))
            .filter(users::first_name.is_not_null())
            .filter(users::last_name.is_not_null())
            .filter(users::date_of_birth.is_not_null())
            .filter(users::about.is_not_null())
            .filter(users::users_gender.eq(self.wanted_gender.as_str()))
            .filter(users::interested_in_gender.eq(self.seeker_gender.as_str()))
            .into_boxed()
    }
}

fn page_query(criteria: &DiscoveryCriteria, params: &PaginationParams) -> users::BoxedQuery<'static, Pg> {
    criteria
        .query()
        .order((users::created_at.asc(), users::id.asc()))
        .offset(params.sql_offset())
        .limit(params.sql_limit())
}

/// One page of candidates, oldest accounts first, plus the total count.
pub fn find_candidates(
    conn: &mut PgConnection,
    criteria: &DiscoveryCriteria,
    params: &PaginationParams,
) -> AppResult<(Vec<User>, i64)> {
    let total: i64 = criteria.query().count().get_result(conn)?;

    let candidates = page_query(criteria, params).load::<User>(conn)?;

    tracing::debug!(
        seeker_id = %criteria.seeker_id,
        total,
        returned = candidates.len(),
        "discovery candidates loaded"
    );

    Ok((candidates, total))
}
