//! Roster endpoints: creation, listing, availability aggregation and the
//! synchronous generation entry point.

use chrono::NaiveDate;
use rocket::form::FromForm;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::api::{ErrorResponse, error_status, error_status_with_details};
use crate::generation::client::{clean_fenced_json, parse_shift_payload};
use crate::generation::prompt::build_prompt;
use crate::generation::{GenerationError, PipelineContext};
use crate::jobs::{JobKind, JobQueue};
use crate::logged_json::LoggedJson;
use crate::models::{ACTION_CREATE_ROSTER, AvailabilityRow, Roster};
use crate::orm::DbConn;
use crate::orm::activity_log::record_activity;
use crate::orm::availability::{AvailabilityScope, aggregate_team_availability};
use crate::orm::roster::{get_rosters_by_team, insert_roster};
use crate::orm::team::get_team_for_user;
use crate::session_guards::{AuthenticatedUser, OwnerUser};

#[derive(Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateRosterRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Serialize, TS)]
#[ts(export)]
pub struct CreateRosterResponse {
    pub success: bool,
    pub data: Roster,
}

fn parse_day(raw: &str, label: &str) -> Result<NaiveDate, status::Custom<Json<ErrorResponse>>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        error_status(
            Status::BadRequest,
            format!("{} must be a valid YYYY-MM-DD date, got '{}'", label, raw),
        )
    })
}

/// Create Roster endpoint.
///
/// - **URL:** `/roster/create`
/// - **Method:** `POST`
/// - **Purpose:** Creates a roster for the owner's team over a date range
/// - **Authentication:** Required
/// - **Authorization:** Team owner only
///
/// # Request Format
///
/// ```json
/// { "startDate": "2024-03-04", "endDate": "2024-03-10" }
/// ```
///
/// Missing, malformed or out-of-order dates answer 400 and no roster row
/// is created.
#[post("/roster/create", data = "<request>")]
pub async fn create_roster(
    db: DbConn,
    auth_user: OwnerUser,
    request: LoggedJson<CreateRosterRequest>,
) -> Result<Json<CreateRosterResponse>, status::Custom<Json<ErrorResponse>>> {
    let body = request.into_inner();
    let (Some(start_raw), Some(end_raw)) = (body.start_date, body.end_date) else {
        return Err(error_status(
            Status::BadRequest,
            "Start date and end date are required",
        ));
    };

    let start = parse_day(&start_raw, "startDate")?;
    let end = parse_day(&end_raw, "endDate")?;
    if end < start {
        return Err(error_status(
            Status::BadRequest,
            "End date must be on or after start date",
        ));
    }

    let user_id = auth_user.user.id;
    db.run(move |conn| {
        let team = match get_team_for_user(conn, user_id) {
            Ok(Some(team)) => team,
            Ok(None) => {
                return Err(error_status(Status::NotFound, "No team found"));
            }
            Err(e) => {
                eprintln!("Error loading team for roster creation: {:?}", e);
                return Err(error_status(
                    Status::InternalServerError,
                    "Internal server error while loading team",
                ));
            }
        };

        match insert_roster(conn, team.id, start, end, user_id) {
            Ok(roster) => {
                if let Err(e) =
                    record_activity(conn, team.id, Some(user_id), ACTION_CREATE_ROSTER, None)
                {
                    eprintln!("Failed to record roster creation activity: {:?}", e);
                }
                Ok(Json(CreateRosterResponse {
                    success: true,
                    data: roster,
                }))
            }
            Err(e) => {
                eprintln!("Error creating roster: {:?}", e);
                Err(error_status(
                    Status::InternalServerError,
                    "Failed to create roster",
                ))
            }
        }
    })
    .await
}

/// List Rosters endpoint.
///
/// - **URL:** `/roster/list`
/// - **Method:** `GET`
/// - **Purpose:** Lists the caller's team rosters, newest first
/// - **Authentication:** Required
#[get("/roster/list")]
pub async fn list_rosters(
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> Result<Json<Vec<Roster>>, status::Custom<Json<ErrorResponse>>> {
    let user_id = auth_user.user.id;
    db.run(move |conn| {
        let team = match get_team_for_user(conn, user_id) {
            Ok(Some(team)) => team,
            Ok(None) => return Err(error_status(Status::NotFound, "No team found")),
            Err(e) => {
                eprintln!("Error loading team for roster list: {:?}", e);
                return Err(error_status(
                    Status::InternalServerError,
                    "Failed to fetch rosters",
                ));
            }
        };

        get_rosters_by_team(conn, team.id).map(Json).map_err(|e| {
            eprintln!("Error fetching rosters: {:?}", e);
            error_status(Status::InternalServerError, "Failed to fetch rosters")
        })
    })
    .await
}

#[derive(FromForm)]
pub struct AvailabilityQuery {
    #[field(name = "startDate")]
    pub start_date: Option<String>,
    #[field(name = "endDate")]
    pub end_date: Option<String>,
    pub scope: Option<String>,
}

/// Team Availability endpoint.
///
/// - **URL:** `/roster/availability?startDate&endDate[&scope]`
/// - **Method:** `GET`
/// - **Purpose:** Returns the aggregated availability payload used as the
///   generation input: one row per (member, date) record in range, joined
///   with the member's scheduling constraints
/// - **Authentication:** Required
///
/// `scope` is `respondedOnly` (default, configurable) or `allMembers`. No
/// availability in range is an empty array, not an error.
#[get("/roster/availability?<params..>")]
pub async fn team_availability(
    db: DbConn,
    auth_user: AuthenticatedUser,
    pipeline: &State<PipelineContext>,
    params: AvailabilityQuery,
) -> Result<Json<Vec<AvailabilityRow>>, status::Custom<Json<ErrorResponse>>> {
    let (Some(start_raw), Some(end_raw)) = (params.start_date, params.end_date) else {
        return Err(error_status(
            Status::BadRequest,
            "startDate and endDate query parameters are required",
        ));
    };

    let start = parse_day(&start_raw, "startDate")?;
    let end = parse_day(&end_raw, "endDate")?;

    let scope = match params.scope {
        Some(raw) => AvailabilityScope::parse(&raw)
            .map_err(|e| error_status(Status::BadRequest, e))?,
        None => pipeline.settings.availability_scope,
    };

    let user_id = auth_user.user.id;
    db.run(move |conn| {
        let team = match get_team_for_user(conn, user_id) {
            Ok(Some(team)) => team,
            Ok(None) => return Err(error_status(Status::NotFound, "No team found")),
            Err(e) => {
                eprintln!("Error loading team for availability: {:?}", e);
                return Err(error_status(
                    Status::InternalServerError,
                    "Failed to fetch availability",
                ));
            }
        };

        aggregate_team_availability(conn, team.id, start, end, scope)
            .map(Json)
            .map_err(|e| {
                eprintln!("Error aggregating availability: {:?}", e);
                error_status(Status::InternalServerError, "Failed to fetch availability")
            })
    })
    .await
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct GenerateRosterRequest {
    #[ts(type = "unknown")]
    pub roster: Option<Value>,
    #[ts(type = "unknown")]
    pub availability: Option<Value>,
}

#[derive(Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GenerateRosterResponse {
    pub success: bool,
    #[ts(type = "unknown[]")]
    pub shifts: Vec<Value>,
    pub job_id: String,
}

/// Generate Roster endpoint (synchronous variant).
///
/// - **URL:** `/roster/generate`
/// - **Method:** `POST`
/// - **Purpose:** Calls the generative model inline, returns the parsed
///   shift array, and queues a background job to validate and persist it
/// - **Authentication:** Required
///
/// # Failure modes
/// * 400 — missing roster or availability payload
/// * 502 — the generation service is unreachable or answered abnormally
/// * 422 — the model's output was not parseable JSON; the cleaned raw text
///   is returned in `details` for diagnosis
#[post("/roster/generate", data = "<request>")]
pub async fn generate_roster(
    _auth_user: AuthenticatedUser,
    pipeline: &State<PipelineContext>,
    queue: &State<JobQueue>,
    request: LoggedJson<GenerateRosterRequest>,
) -> Result<Json<GenerateRosterResponse>, status::Custom<Json<ErrorResponse>>> {
    let body = request.into_inner();
    let (Some(roster), Some(availability)) = (body.roster, body.availability) else {
        return Err(error_status(
            Status::BadRequest,
            "Missing required roster or availability data",
        ));
    };

    let prompt = build_prompt(&pipeline.template, &roster, &availability);
    let text = pipeline
        .generator
        .generate(&prompt)
        .await
        .map_err(|e| error_status(Status::BadGateway, e.to_string()))?;

    let cleaned = clean_fenced_json(&text);
    let records = parse_shift_payload(&cleaned).map_err(|e| match e {
        GenerationError::MalformedOutput { detail, raw } => error_status_with_details(
            Status::UnprocessableEntity,
            format!("Invalid JSON response from AI: {}", detail),
            Value::String(raw),
        ),
        other => error_status(Status::BadGateway, other.to_string()),
    })?;

    let job_id = queue.enqueue(JobKind::PersistShifts {
        records: records.clone(),
    });

    Ok(Json(GenerateRosterResponse {
        success: true,
        shifts: records,
        job_id: job_id.to_string(),
    }))
}

pub fn routes() -> Vec<Route> {
    routes![create_roster, list_rosters, team_availability, generate_roster]
}
