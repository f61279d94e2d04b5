//! Availability storage and the aggregation feeding roster generation.
//!
//! Availability rows are the read-only input to the generation pipeline:
//! the aggregator joins every in-range row with the user's scheduling
//! constraints to build the payload the prompt is rendered from.

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Availability, AvailabilityRow, NewAvailability, User};
use crate::orm::team_member::get_member_ids;
use crate::orm::user::get_users_by_ids;

/// Which users appear in the aggregated payload.
///
/// The underlying join is ambiguous in intent: filtering the joined
/// availability side by date range silently drops users who never
/// responded. Rather than bake in either reading, the choice is explicit
/// and configurable (`generation.availability_scope`, or the `scope` query
/// parameter per request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AvailabilityScope {
    /// Only users with at least one availability row in range (inner-join
    /// semantics). This matches the behavior the dashboard relies on.
    RespondedOnly,
    /// Every team member; members without rows in range appear once with
    /// null flags so the model can see who never answered.
    AllMembers,
}

impl Default for AvailabilityScope {
    fn default() -> Self {
        AvailabilityScope::RespondedOnly
    }
}

impl AvailabilityScope {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "respondedOnly" => Ok(AvailabilityScope::RespondedOnly),
            "allMembers" => Ok(AvailabilityScope::AllMembers),
            other => Err(format!(
                "Unknown availability scope '{}'; expected respondedOnly or allMembers",
                other
            )),
        }
    }
}

/// Creates or overwrites the availability flags for one (user, date).
///
/// Resubmitting the same date updates the existing row in place; a second
/// row is never created.
pub fn upsert_availability(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    day: NaiveDate,
    am: bool,
    pm: bool,
    night: bool,
) -> Result<Availability, diesel::result::Error> {
    use crate::schema::user_availability::dsl::*;

    let row = NewAvailability {
        user_id: target_user_id,
        date: day,
        is_available_am: am,
        is_available_pm: pm,
        is_available_night: night,
    };

    diesel::insert_into(user_availability)
        .values(&row)
        .on_conflict((user_id, date))
        .do_update()
        .set((
            is_available_am.eq(am),
            is_available_pm.eq(pm),
            is_available_night.eq(night),
        ))
        .execute(conn)?;

    user_availability
        .filter(user_id.eq(target_user_id))
        .filter(date.eq(day))
        .first::<Availability>(conn)
}

/// Returns one user's availability rows within [start, end], both bounds
/// inclusive, ordered by date.
pub fn get_availability_for_user(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Availability>, diesel::result::Error> {
    use crate::schema::user_availability::dsl::*;

    user_availability
        .filter(user_id.eq(target_user_id))
        .filter(date.ge(start))
        .filter(date.le(end))
        .order(date.asc())
        .load::<Availability>(conn)
}

fn row_for(user: &User, availability: Option<&Availability>) -> AvailabilityRow {
    AvailabilityRow {
        user_id: user.id,
        role: user.role.clone(),
        hourly_rate: user.hourly_rate,
        max_weekly_hours: user.max_weekly_hours,
        min_weekly_hours: user.min_weekly_hours,
        seniority: user.seniority,
        position: user.position.clone(),
        date: availability.map(|a| a.date),
        is_available_am: availability.map(|a| a.is_available_am),
        is_available_pm: availability.map(|a| a.is_available_pm),
        is_available_night: availability.map(|a| a.is_available_night),
    }
}

/// Builds the generation payload for a team over [start, end].
///
/// Returns one row per (member, date) availability record in range, joined
/// with the member's scheduling constraints, grouped by user id and ordered
/// by date. An empty range is an empty vector, not an error.
pub fn aggregate_team_availability(
    conn: &mut SqliteConnection,
    target_team_id: i32,
    start: NaiveDate,
    end: NaiveDate,
    scope: AvailabilityScope,
) -> Result<Vec<AvailabilityRow>, diesel::result::Error> {
    use crate::schema::user_availability::dsl::*;

    let member_ids = get_member_ids(conn, target_team_id)?;
    let members = get_users_by_ids(conn, &member_ids)?;

    let in_range: Vec<Availability> = user_availability
        .filter(user_id.eq_any(&member_ids))
        .filter(date.ge(start))
        .filter(date.le(end))
        .order((user_id.asc(), date.asc()))
        .load::<Availability>(conn)?;

    let mut rows = Vec::new();
    for member in &members {
        let member_rows: Vec<&Availability> =
            in_range.iter().filter(|a| a.user_id == member.id).collect();

        if member_rows.is_empty() {
            if scope == AvailabilityScope::AllMembers {
                rows.push(row_for(member, None));
            }
            continue;
        }

        for availability in member_rows {
            rows.push(row_for(member, Some(availability)));
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{setup_test_db, setup_test_member, setup_test_team};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_upsert_is_idempotent_per_day() {
        let mut conn = setup_test_db();
        let (team, _owner) = setup_test_team(&mut conn);
        let member = setup_test_member(&mut conn, team.id, "kay@example.com");

        upsert_availability(&mut conn, member.id, day(5), true, false, false).expect("first");
        upsert_availability(&mut conn, member.id, day(5), false, true, true).expect("second");

        let rows = get_availability_for_user(&mut conn, member.id, day(1), day(31)).expect("load");
        assert_eq!(rows.len(), 1, "resubmission must not duplicate the row");
        assert!(!rows[0].is_available_am);
        assert!(rows[0].is_available_pm);
        assert!(rows[0].is_available_night);
    }

    #[test]
    fn test_aggregation_range_bounds_inclusive() {
        let mut conn = setup_test_db();
        let (team, _owner) = setup_test_team(&mut conn);
        let member = setup_test_member(&mut conn, team.id, "kay@example.com");

        // One row on each boundary, one a day outside each boundary.
        for d in [4, 5, 10, 11] {
            upsert_availability(&mut conn, member.id, day(d), true, false, false).expect("upsert");
        }

        let rows = aggregate_team_availability(
            &mut conn,
            team.id,
            day(5),
            day(10),
            AvailabilityScope::RespondedOnly,
        )
        .expect("aggregate");

        let dates: Vec<NaiveDate> = rows.iter().filter_map(|r| r.date).collect();
        assert_eq!(dates, vec![day(5), day(10)]);
    }

    #[test]
    fn test_scope_controls_silent_members() {
        let mut conn = setup_test_db();
        let (team, _owner) = setup_test_team(&mut conn);
        let responder = setup_test_member(&mut conn, team.id, "kay@example.com");
        let _silent = setup_test_member(&mut conn, team.id, "lee@example.com");

        upsert_availability(&mut conn, responder.id, day(6), true, true, false).expect("upsert");

        let responded = aggregate_team_availability(
            &mut conn,
            team.id,
            day(1),
            day(31),
            AvailabilityScope::RespondedOnly,
        )
        .expect("aggregate");
        assert_eq!(responded.len(), 1);
        assert_eq!(responded[0].user_id, responder.id);

        let everyone = aggregate_team_availability(
            &mut conn,
            team.id,
            day(1),
            day(31),
            AvailabilityScope::AllMembers,
        )
        .expect("aggregate");
        // owner + responder + silent member, silent ones with null flags
        assert_eq!(everyone.len(), 3);
        let silent_rows: Vec<_> = everyone.iter().filter(|r| r.date.is_none()).collect();
        assert_eq!(silent_rows.len(), 2);
        assert!(silent_rows.iter().all(|r| r.is_available_am.is_none()));
    }

    #[test]
    fn test_empty_range_is_not_an_error() {
        let mut conn = setup_test_db();
        let (team, _owner) = setup_test_team(&mut conn);

        let rows = aggregate_team_availability(
            &mut conn,
            team.id,
            day(1),
            day(31),
            AvailabilityScope::RespondedOnly,
        )
        .expect("aggregate");
        assert!(rows.is_empty());
    }
}
