use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::rosters;

/// A team-scoped scheduling period bounded by a start and end calendar date.
///
/// Rosters are created once by an owner and never mutated afterwards; the
/// generated shifts hang off the roster id.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::team::Team))]
#[diesel(table_name = rosters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Roster {
    pub id: i32,
    pub team_id: i32,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string")]
    pub end_date: NaiveDate,
    pub created_by: i32,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = rosters)]
pub struct NewRoster {
    pub team_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
}
