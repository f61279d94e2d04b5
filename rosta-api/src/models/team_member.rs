use chrono::NaiveDateTime;
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::team_members;

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::team::Team))]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(table_name = team_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TeamMember {
    pub id: i32,
    pub user_id: i32,
    pub team_id: i32,
    pub role: String,
    #[ts(type = "string")]
    pub joined_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = team_members)]
pub struct NewTeamMember {
    pub user_id: i32,
    pub team_id: i32,
    pub role: String,
    pub joined_at: NaiveDateTime,
}
