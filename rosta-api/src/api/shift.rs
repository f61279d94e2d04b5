//! Shift endpoints: direct batch submission and per-roster views.

use rocket::Route;
use rocket::form::FromForm;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::api::{ErrorResponse, error_status, error_status_with_details};
use crate::generation::validator::validate_shift_batch;
use crate::logged_json::LoggedJson;
use crate::models::{Shift, ShiftType, ShiftWithUser};
use crate::orm::DbConn;
use crate::orm::roster::get_roster;
use crate::orm::shift::{
    ShiftBatchError, get_shifts_with_users, insert_shift_batch, update_shift,
};
use crate::orm::team::get_team_for_user;
use crate::session_guards::{AuthenticatedUser, OwnerUser};

#[derive(Serialize, TS)]
#[ts(export)]
pub struct CreateShiftsResponse {
    pub success: bool,
    pub shifts: Vec<Shift>,
}

/// Create Shifts endpoint.
///
/// - **URL:** `/roster/shifts`
/// - **Method:** `POST`
/// - **Purpose:** Validates and batch-inserts an array of shift records
/// - **Authentication:** Required
///
/// The body is the same array-of-records shape the generation pipeline
/// produces. Validation is all-or-nothing: any violation answers 400 with
/// the full error list in `details` and zero rows persisted.
#[post("/roster/shifts", data = "<records>")]
pub async fn create_shifts(
    db: DbConn,
    _auth_user: AuthenticatedUser,
    records: LoggedJson<Vec<Value>>,
) -> Result<Json<CreateShiftsResponse>, status::Custom<Json<ErrorResponse>>> {
    let records = records.into_inner();

    let candidates = validate_shift_batch(&records).map_err(|errors| {
        error_status_with_details(
            Status::BadRequest,
            "Failed to create shifts",
            Value::Array(errors.into_iter().map(Value::String).collect()),
        )
    })?;

    db.run(move |conn| match insert_shift_batch(conn, &candidates) {
        Ok(shifts) => Ok(Json(CreateShiftsResponse {
            success: true,
            shifts,
        })),
        Err(e @ ShiftBatchError::Database(_)) => {
            eprintln!("Error saving shifts: {}", e);
            Err(error_status(Status::InternalServerError, e.to_string()))
        }
        Err(e) => Err(error_status(Status::BadRequest, e.to_string())),
    })
    .await
}

#[derive(FromForm)]
pub struct ShiftsByTeamQuery {
    #[field(name = "rosterId")]
    pub roster_id: Option<i32>,
}

#[derive(Serialize, TS)]
#[ts(export)]
pub struct ShiftsByTeamResponse {
    pub shifts: Vec<ShiftWithUser>,
}

/// Shifts By Team endpoint.
///
/// - **URL:** `/roster/shifts_by_team?rosterId`
/// - **Method:** `GET`
/// - **Purpose:** Returns a roster's shifts joined with assignee names
/// - **Authentication:** Required; the roster must belong to the caller's
///   team
#[get("/roster/shifts_by_team?<params..>")]
pub async fn shifts_by_team(
    db: DbConn,
    auth_user: AuthenticatedUser,
    params: ShiftsByTeamQuery,
) -> Result<Json<ShiftsByTeamResponse>, status::Custom<Json<ErrorResponse>>> {
    let Some(roster_id) = params.roster_id else {
        return Err(error_status(Status::BadRequest, "Roster ID is required"));
    };

    let user_id = auth_user.user.id;
    db.run(move |conn| {
        let roster = match get_roster(conn, roster_id) {
            Ok(Some(roster)) => roster,
            Ok(None) => return Err(error_status(Status::NotFound, "Roster not found")),
            Err(e) => {
                eprintln!("Error loading roster {}: {:?}", roster_id, e);
                return Err(error_status(
                    Status::InternalServerError,
                    "Failed to fetch shifts",
                ));
            }
        };

        match get_team_for_user(conn, user_id) {
            Ok(Some(team)) if team.id == roster.team_id => {}
            Ok(_) => {
                return Err(error_status(
                    Status::Forbidden,
                    "Roster does not belong to your team",
                ));
            }
            Err(e) => {
                eprintln!("Error loading team for shifts view: {:?}", e);
                return Err(error_status(
                    Status::InternalServerError,
                    "Failed to fetch shifts",
                ));
            }
        }

        get_shifts_with_users(conn, roster_id)
            .map(|shifts| Json(ShiftsByTeamResponse { shifts }))
            .map_err(|e| {
                eprintln!("Error fetching shifts: {:?}", e);
                error_status(Status::InternalServerError, "Failed to fetch shifts")
            })
    })
    .await
}

#[derive(Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateShiftRequest {
    pub shift_type: Option<String>,
    pub start_time: Option<String>,
    pub finish_time: Option<String>,
    pub hours: Option<f64>,
}

/// Update Shift endpoint (manual correction outside the generation path).
///
/// - **URL:** `/roster/shifts/<shift_id>`
/// - **Method:** `PUT`
/// - **Purpose:** Partially updates one shift; only provided fields change
/// - **Authentication:** Required
/// - **Authorization:** Team owner only
///
/// Unlike generated batches, manual corrections may use any label of the
/// full shift-type enum, including Night.
#[put("/roster/shifts/<shift_id>", data = "<request>")]
pub async fn correct_shift(
    db: DbConn,
    _auth_user: OwnerUser,
    shift_id: i32,
    request: LoggedJson<UpdateShiftRequest>,
) -> Result<Json<Shift>, status::Custom<Json<ErrorResponse>>> {
    let body = request.into_inner();

    if let Some(ref raw) = body.shift_type {
        ShiftType::from_str(raw).map_err(|e| error_status(Status::BadRequest, e))?;
    }
    if let Some(hours) = body.hours {
        if hours <= 0.0 || hours > 24.0 {
            return Err(error_status(
                Status::BadRequest,
                "hours must be greater than 0 and at most 24",
            ));
        }
    }

    db.run(move |conn| {
        match update_shift(
            conn,
            shift_id,
            body.shift_type,
            body.start_time,
            body.finish_time,
            body.hours,
        ) {
            Ok(shift) => Ok(Json(shift)),
            Err(diesel::result::Error::NotFound) => {
                Err(error_status(Status::NotFound, "Shift not found"))
            }
            Err(e) => {
                eprintln!("Error updating shift {}: {:?}", shift_id, e);
                Err(error_status(
                    Status::InternalServerError,
                    "Failed to update shift",
                ))
            }
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![create_shifts, shifts_by_team, correct_shift]
}
