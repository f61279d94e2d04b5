use chrono::Utc;
use diesel::prelude::*;

use crate::models::{NewTeamMember, TeamMember};

/// Adds a user to a team with the given membership role.
pub fn add_team_member(
    conn: &mut SqliteConnection,
    member_user_id: i32,
    member_team_id: i32,
    member_role: &str,
) -> Result<TeamMember, diesel::result::Error> {
    use crate::schema::team_members::dsl::*;

    let new_member = NewTeamMember {
        user_id: member_user_id,
        team_id: member_team_id,
        role: member_role.to_string(),
        joined_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(team_members)
        .values(&new_member)
        .execute(conn)?;

    team_members
        .filter(user_id.eq(member_user_id))
        .filter(team_id.eq(member_team_id))
        .first::<TeamMember>(conn)
}

/// Returns the ids of every user on the given team, ordered by user id.
pub fn get_member_ids(
    conn: &mut SqliteConnection,
    target_team_id: i32,
) -> Result<Vec<i32>, diesel::result::Error> {
    use crate::schema::team_members::dsl::*;
    team_members
        .filter(team_id.eq(target_team_id))
        .order(user_id.asc())
        .select(user_id)
        .load::<i32>(conn)
}
