//! Logout endpoint: revokes the current session and clears the cookie.

use rocket::Route;
use rocket::http::CookieJar;
use rocket::serde::json::{Json, Value, json};

use crate::orm::DbConn;
use crate::orm::logout::revoke_session;

/// Logout endpoint.
///
/// - **URL:** `/logout`
/// - **Method:** `POST`
/// - **Purpose:** Revokes the session behind the `session` cookie
/// - **Authentication:** Not enforced; logging out without a session is a
///   no-op that still answers success
#[post("/logout")]
pub async fn logout(db: DbConn, cookies: &CookieJar<'_>) -> Json<Value> {
    if let Some(cookie) = cookies.get("session") {
        if let Err(e) = revoke_session(&db, cookie.value()).await {
            eprintln!("Failed to revoke session: {:?}", e);
        }
        cookies.remove("session");
    }

    Json(json!({ "success": true }))
}

pub fn routes() -> Vec<Route> {
    routes![logout]
}
