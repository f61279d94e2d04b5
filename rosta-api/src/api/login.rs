//! Login endpoint: verifies credentials, creates a session and sets the
//! session cookie.

use rocket::Route;
use rocket::http::{CookieJar, Status};
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::{ErrorResponse, error_status};
use crate::logged_json::LoggedJson;
use crate::models::ACTION_SIGN_IN;
use crate::orm::DbConn;
use crate::orm::activity_log::record_activity;
use crate::orm::login::process_login;
use crate::orm::team::get_team_for_user;

#[derive(Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub user_id: i32,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub team_name: Option<String>,
}

/// Login endpoint.
///
/// - **URL:** `/login`
/// - **Method:** `POST`
/// - **Purpose:** Authenticates a user and establishes a session
/// - **Authentication:** None required
///
/// Invalid credentials and unknown accounts both answer 401 with the same
/// generic message; empty fields answer 400.
#[post("/login", data = "<login>")]
pub async fn login(
    db: DbConn,
    cookies: &CookieJar<'_>,
    login: LoggedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, status::Custom<Json<ErrorResponse>>> {
    let user = match process_login(&db, cookies, &login).await {
        Ok(user) => user,
        Err(Status::BadRequest) => {
            return Err(error_status(
                Status::BadRequest,
                "Email and password are required",
            ));
        }
        Err(Status::Unauthorized) => {
            return Err(error_status(Status::Unauthorized, "Invalid credentials"));
        }
        Err(_) => {
            return Err(error_status(
                Status::InternalServerError,
                "Internal server error",
            ));
        }
    };

    let user_id = user.id;
    let team = db
        .run(move |conn| {
            let team = get_team_for_user(conn, user_id)?;
            if let Some(ref team) = team {
                if let Err(e) = record_activity(conn, team.id, Some(user_id), ACTION_SIGN_IN, None)
                {
                    eprintln!("Failed to record sign-in activity: {:?}", e);
                }
            }
            Ok::<_, diesel::result::Error>(team)
        })
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to load team during login: {:?}", e);
            None
        });

    Ok(Json(LoginResponse {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        team_name: team.map(|t| t.name),
    }))
}

pub fn routes() -> Vec<Route> {
    routes![login]
}
