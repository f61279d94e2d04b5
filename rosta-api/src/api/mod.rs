//! HTTP surface of the roster service.
//!
//! Each module owns one area of the API and exposes a `routes()` function;
//! everything is collected here and mounted at the root in `lib.rs`.

pub mod availability;
pub mod login;
pub mod logout;
pub mod roster;
pub mod shift;
pub mod status;
pub mod trigger;

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::Serialize;
use ts_rs::TS;

/// Error payload shared by every endpoint: a user-facing message plus an
/// optional machine-readable detail field (validation error lists, the raw
/// model output on parse failure).
#[derive(Serialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown | null")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            error: message.into(),
            details: None,
        }
    }

    pub fn with_details(message: impl Into<String>, details: serde_json::Value) -> Self {
        ErrorResponse {
            error: message.into(),
            details: Some(details),
        }
    }
}

/// Builds an error response with the given status code.
pub(crate) fn error_status(
    code: Status,
    message: impl Into<String>,
) -> status::Custom<Json<ErrorResponse>> {
    status::Custom(code, Json(ErrorResponse::new(message)))
}

/// Builds an error response carrying a detail payload.
pub(crate) fn error_status_with_details(
    code: Status,
    message: impl Into<String>,
    details: serde_json::Value,
) -> status::Custom<Json<ErrorResponse>> {
    status::Custom(code, Json(ErrorResponse::with_details(message, details)))
}

/// Returns every route of the API for mounting.
pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(availability::routes());
    routes.extend(login::routes());
    routes.extend(logout::routes());
    routes.extend(roster::routes());
    routes.extend(shift::routes());
    routes.extend(status::routes());
    routes.extend(trigger::routes());
    routes
}
