//! Availability upsert endpoint.

use chrono::NaiveDate;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ErrorResponse, error_status};
use crate::logged_json::LoggedJson;
use crate::models::{ACTION_UPDATE_AVAILABILITY, Availability};
use crate::orm::DbConn;
use crate::orm::activity_log::record_activity;
use crate::orm::availability::upsert_availability;
use crate::orm::team::get_team_for_user;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SetAvailabilityRequest {
    /// Defaults to the caller; setting another user's availability requires
    /// the owner role.
    pub user_id: Option<i32>,
    pub date: String,
    #[serde(rename = "isAvailableAM")]
    pub is_available_am: bool,
    #[serde(rename = "isAvailablePM")]
    pub is_available_pm: bool,
    pub is_available_night: bool,
}

#[derive(Serialize, TS)]
#[ts(export)]
pub struct SetAvailabilityResponse {
    pub success: bool,
    pub data: Availability,
}

/// Set Availability endpoint.
///
/// - **URL:** `/availability`
/// - **Method:** `POST`
/// - **Purpose:** Creates or overwrites one (user, date) availability row
/// - **Authentication:** Required
/// - **Authorization:** Users set their own availability; owners may set
///   any user's
///
/// Upsert semantics: resubmitting the same date overwrites the flags and
/// never duplicates the row.
#[post("/availability", data = "<request>")]
pub async fn set_availability(
    db: DbConn,
    auth_user: AuthenticatedUser,
    request: LoggedJson<SetAvailabilityRequest>,
) -> Result<Json<SetAvailabilityResponse>, status::Custom<Json<ErrorResponse>>> {
    let body = request.into_inner();
    let target_user_id = body.user_id.unwrap_or(auth_user.user.id);

    if target_user_id != auth_user.user.id && !auth_user.is_owner() {
        return Err(error_status(
            Status::Forbidden,
            "You do not have permission to set availability for this user",
        ));
    }

    let day = NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").map_err(|_| {
        error_status(
            Status::BadRequest,
            format!("date must be a valid YYYY-MM-DD date, got '{}'", body.date),
        )
    })?;

    let actor_id = auth_user.user.id;
    db.run(move |conn| {
        match upsert_availability(
            conn,
            target_user_id,
            day,
            body.is_available_am,
            body.is_available_pm,
            body.is_available_night,
        ) {
            Ok(data) => {
                match get_team_for_user(conn, target_user_id) {
                    Ok(Some(team)) => {
                        if let Err(e) = record_activity(
                            conn,
                            team.id,
                            Some(actor_id),
                            ACTION_UPDATE_AVAILABILITY,
                            None,
                        ) {
                            eprintln!("Failed to record availability activity: {:?}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("Failed to load team for activity log: {:?}", e),
                }
                Ok(Json(SetAvailabilityResponse {
                    success: true,
                    data,
                }))
            }
            Err(e) => {
                eprintln!("Create availability error: {:?}", e);
                Err(error_status(
                    Status::InternalServerError,
                    "Failed to update availability",
                ))
            }
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![set_availability]
}
