use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::users;

/// A staff member, carrying the scheduling constraints the generation
/// pipeline feeds to the model alongside availability.
#[derive(
    Queryable, Selectable, Identifiable, QueryableByName, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub name: Option<String>,
    pub email: String, // Will be unique
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: String, // "owner" or "member"
    pub hourly_rate: f64,
    pub max_weekly_hours: i32,
    pub min_weekly_hours: i32,
    pub seniority: i32,
    pub position: String,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn is_owner(&self) -> bool {
        self.role == "owner"
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub hourly_rate: f64,
    pub max_weekly_hours: i32,
    pub min_weekly_hours: i32,
    pub seniority: i32,
    pub position: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// For API inputs; timestamps are filled in by the ORM layer.
#[derive(Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub hourly_rate: f64,
    pub max_weekly_hours: i32,
    pub min_weekly_hours: i32,
    pub seniority: i32,
    pub position: String,
}
