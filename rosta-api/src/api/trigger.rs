//! Asynchronous generation entry point: hand the payload to the background
//! queue and answer immediately with a task id.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use uuid::Uuid;

use crate::api::{ErrorResponse, error_status};
use crate::jobs::{JobKind, JobQueue, JobRecord};
use crate::logged_json::LoggedJson;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct TriggerGenerationRequest {
    #[ts(type = "unknown")]
    pub roster: Option<Value>,
    #[ts(type = "unknown")]
    pub availability: Option<Value>,
}

#[derive(Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TriggerGenerationResponse {
    pub task_id: String,
    pub message: String,
}

/// Trigger Roster Generation endpoint.
///
/// - **URL:** `/trigger/roster-generation`
/// - **Method:** `POST`
/// - **Purpose:** Enqueues the full generation pipeline (prompt → model →
///   validate → persist) as a background job
/// - **Authentication:** Required
///
/// The response carries only the task id; the slow model call never blocks
/// the request. Poll the status endpoint with the id to observe the job.
#[post("/trigger/roster-generation", data = "<request>")]
pub async fn trigger_roster_generation(
    _auth_user: AuthenticatedUser,
    queue: &State<JobQueue>,
    request: LoggedJson<TriggerGenerationRequest>,
) -> Result<Json<TriggerGenerationResponse>, status::Custom<Json<ErrorResponse>>> {
    let body = request.into_inner();
    let (Some(roster), Some(availability)) = (body.roster, body.availability) else {
        return Err(error_status(
            Status::BadRequest,
            "Missing required roster or availability data",
        ));
    };

    let task_id = queue.enqueue(JobKind::GenerateAndPersist {
        roster,
        availability,
    });

    Ok(Json(TriggerGenerationResponse {
        task_id: task_id.to_string(),
        message: "Roster generation task queued successfully".to_string(),
    }))
}

/// Generation Task Status endpoint.
///
/// - **URL:** `/trigger/roster-generation/<task_id>`
/// - **Method:** `GET`
/// - **Purpose:** Returns the job record for a queued generation task
/// - **Authentication:** Required
#[get("/trigger/roster-generation/<task_id>")]
pub async fn generation_status(
    _auth_user: AuthenticatedUser,
    queue: &State<JobQueue>,
    task_id: &str,
) -> Result<Json<JobRecord>, status::Custom<Json<ErrorResponse>>> {
    let task_id = Uuid::parse_str(task_id)
        .map_err(|_| error_status(Status::NotFound, "Unknown task id"))?;

    queue
        .status(&task_id)
        .map(Json)
        .ok_or_else(|| error_status(Status::NotFound, "Unknown task id"))
}

pub fn routes() -> Vec<Route> {
    routes![trigger_roster_generation, generation_status]
}
