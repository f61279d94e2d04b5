use chrono::{NaiveDate, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::models::{NewRoster, Roster};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Inserts a new roster for a team over a date range.
///
/// The end-before-start check belongs to the API boundary; this function
/// still refuses an inverted range so no caller can bypass the invariant.
pub fn insert_roster(
    conn: &mut SqliteConnection,
    roster_team_id: i32,
    start: NaiveDate,
    end: NaiveDate,
    creator_user_id: i32,
) -> Result<Roster, diesel::result::Error> {
    use crate::schema::rosters::dsl::*;

    if end < start {
        return Err(diesel::result::Error::QueryBuilderError(
            "roster end date precedes start date".into(),
        ));
    }

    let new_roster = NewRoster {
        team_id: roster_team_id,
        start_date: start,
        end_date: end,
        created_by: creator_user_id,
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(rosters)
        .values(&new_roster)
        .execute(conn)?;

    let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid;

    rosters.filter(id.eq(last_id as i32)).first::<Roster>(conn)
}

/// Gets a single roster by ID.
pub fn get_roster(
    conn: &mut SqliteConnection,
    roster_id: i32,
) -> Result<Option<Roster>, diesel::result::Error> {
    use crate::schema::rosters::dsl::*;
    rosters
        .filter(id.eq(roster_id))
        .first::<Roster>(conn)
        .optional()
}

/// Returns all rosters for a team, newest first.
pub fn get_rosters_by_team(
    conn: &mut SqliteConnection,
    target_team_id: i32,
) -> Result<Vec<Roster>, diesel::result::Error> {
    use crate::schema::rosters::dsl::*;
    rosters
        .filter(team_id.eq(target_team_id))
        .order(created_at.desc())
        .load::<Roster>(conn)
}
