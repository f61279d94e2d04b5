use chrono::NaiveDateTime;
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::Serialize;
use ts_rs::TS;

use crate::schema::activity_logs;

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Serialize, TS)]
#[diesel(belongs_to(crate::models::team::Team))]
#[diesel(table_name = activity_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActivityLog {
    pub id: i32,
    pub team_id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    #[ts(type = "string")]
    pub timestamp: NaiveDateTime,
    pub ip_address: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = activity_logs)]
pub struct NewActivityLog {
    pub team_id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub timestamp: NaiveDateTime,
    pub ip_address: Option<String>,
}

// Actions recorded by the handlers that mutate scheduling state.
pub const ACTION_SIGN_IN: &str = "SIGN_IN";
pub const ACTION_CREATE_ROSTER: &str = "CREATE_ROSTER";
pub const ACTION_UPDATE_AVAILABILITY: &str = "UPDATE_AVAILABILITY";
