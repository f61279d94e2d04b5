use chrono::Utc;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::models::{NewTeam, Team};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Inserts a new team and returns the stored row.
pub fn insert_team(
    conn: &mut SqliteConnection,
    team_name: String,
) -> Result<Team, diesel::result::Error> {
    use crate::schema::teams::dsl::*;

    let now = Utc::now().naive_utc();
    let new_team = NewTeam {
        name: team_name,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(teams)
        .values(&new_team)
        .execute(conn)?;

    let last_id = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?
        .last_insert_rowid;

    teams.filter(id.eq(last_id as i32)).first::<Team>(conn)
}

/// Gets a single team by ID.
pub fn get_team(
    conn: &mut SqliteConnection,
    team_id: i32,
) -> Result<Option<Team>, diesel::result::Error> {
    use crate::schema::teams::dsl::*;
    teams.filter(id.eq(team_id)).first::<Team>(conn).optional()
}

/// Gets a single team by name.
pub fn get_team_by_name(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Option<Team>, diesel::result::Error> {
    use crate::schema::teams::dsl::*;
    teams
        .filter(name.eq(team_name))
        .first::<Team>(conn)
        .optional()
}

/// Gets the team a user belongs to via their membership row.
///
/// Users hold exactly one membership; if the user has none, `Ok(None)` is
/// returned rather than an error so callers can decide how to respond.
pub fn get_team_for_user(
    conn: &mut SqliteConnection,
    target_user_id: i32,
) -> Result<Option<Team>, diesel::result::Error> {
    use crate::schema::{team_members, teams};

    team_members::table
        .inner_join(teams::table)
        .filter(team_members::user_id.eq(target_user_id))
        .select(Team::as_select())
        .first::<Team>(conn)
        .optional()
}
