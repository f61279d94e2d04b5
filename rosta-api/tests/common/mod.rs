//! Shared helpers for the integration tests.

use rocket::http::Status;
use rocket::local::asynchronous::Client;
use serde_json::json;

/// Signs in as a seeded test user; the tracked client keeps the session
/// cookie for subsequent requests. Returns the user's id.
pub async fn login(client: &Client, email: &str, password: &str) -> i32 {
    let response = client
        .post("/login")
        .json(&json!({ "email": email, "password": password }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok, "login as {} failed", email);

    let body: serde_json::Value = response.into_json().await.unwrap();
    body["userId"].as_i64().expect("login response userId") as i32
}

/// Creates a roster over the given range as the currently signed-in user
/// and returns its id.
pub async fn create_roster(client: &Client, start_date: &str, end_date: &str) -> i32 {
    let response = client
        .post("/roster/create")
        .json(&json!({ "startDate": start_date, "endDate": end_date }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok, "roster creation failed");

    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["success"], true);
    body["data"]["id"].as_i64().expect("roster id") as i32
}

/// One well-formed shift record for the given roster/user.
pub fn shift_record(roster_id: i32, user_id: i32, date: &str, hours: serde_json::Value) -> serde_json::Value {
    json!({
        "rosterId": roster_id,
        "userId": user_id,
        "shiftType": "AM",
        "date": date,
        "startTime": "08:00:00",
        "finishTime": "16:00:00",
        "hours": hours
    })
}
