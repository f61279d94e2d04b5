use chrono::NaiveDate;
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::shifts;

/// One user's assigned work block within a roster.
///
/// `hours` is stored as a fixed 2-decimal string (`"8.00"`), normalized by
/// the batch insert; `start_time`/`finish_time` are `HH:MM:SS` strings
/// checked by the shift validator before anything reaches this table.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::roster::Roster))]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(table_name = shifts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Shift {
    pub id: i32,
    pub roster_id: i32,
    pub user_id: i32,
    pub shift_type: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub start_time: String,
    pub finish_time: String,
    pub hours: String,
}

#[derive(Insertable)]
#[diesel(table_name = shifts)]
pub struct NewShift {
    pub roster_id: i32,
    pub user_id: i32,
    pub shift_type: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub finish_time: String,
    pub hours: String,
}

/// A generated shift record that has passed the validator but has not been
/// persisted yet. `hours` stays numeric here; the batch insert normalizes it
/// to the stored 2-decimal string form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShiftCandidate {
    pub roster_id: i32,
    pub user_id: i32,
    pub shift_type: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub start_time: String,
    pub finish_time: String,
    pub hours: f64,
}

/// A shift joined with the assignee's display name, as returned by the
/// roster views.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShiftWithUser {
    pub id: i32,
    pub roster_id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub shift_type: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub start_time: String,
    pub finish_time: String,
    pub hours: String,
}

/// The full set of shift labels the model is allowed to assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ShiftType {
    AM,
    PM,
    Night,
    NA,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::AM => "AM",
            ShiftType::PM => "PM",
            ShiftType::Night => "Night",
            ShiftType::NA => "NA",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "AM" => Ok(ShiftType::AM),
            "PM" => Ok(ShiftType::PM),
            "Night" => Ok(ShiftType::Night),
            "NA" => Ok(ShiftType::NA),
            other => Err(format!("Unknown shift type: {}", other)),
        }
    }
}
