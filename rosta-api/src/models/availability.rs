use chrono::NaiveDate;
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::user_availability;

/// A user's self-reported per-day willingness to work each of the three
/// time bands. One row per (user, date); resubmission overwrites the flags.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(table_name = user_availability)]
#[diesel(primary_key(user_id, date))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Availability {
    pub user_id: i32,
    #[ts(type = "string")]
    pub date: NaiveDate,
    #[serde(rename = "isAvailableAM")]
    pub is_available_am: bool,
    #[serde(rename = "isAvailablePM")]
    pub is_available_pm: bool,
    pub is_available_night: bool,
}

#[derive(Insertable)]
#[diesel(table_name = user_availability)]
pub struct NewAvailability {
    pub user_id: i32,
    pub date: NaiveDate,
    pub is_available_am: bool,
    pub is_available_pm: bool,
    pub is_available_night: bool,
}

/// One aggregated row handed to the prompt builder: an availability record
/// joined with the user's scheduling constraints. In `AllMembers` scope,
/// members with no availability in range appear once with null flags.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AvailabilityRow {
    pub user_id: i32,
    pub role: String,
    pub hourly_rate: f64,
    pub max_weekly_hours: i32,
    pub min_weekly_hours: i32,
    pub seniority: i32,
    pub position: String,
    #[ts(type = "string | null")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "isAvailableAM")]
    pub is_available_am: Option<bool>,
    #[serde(rename = "isAvailablePM")]
    pub is_available_pm: Option<bool>,
    pub is_available_night: Option<bool>,
}
