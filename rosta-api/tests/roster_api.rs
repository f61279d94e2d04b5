#[macro_use]
extern crate time_test;

use rocket::http::Status;
use rocket::tokio;
use serde_json::json;

use rosta_api::orm::testing::test_rocket;

mod common;

#[tokio::test]
async fn test_owner_creates_roster() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_owner_creates_roster");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/roster/create")
        .json(&json!({ "startDate": "2024-03-04", "endDate": "2024-03-10" }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["startDate"], "2024-03-04");
    assert_eq!(body["data"]["endDate"], "2024-03-10");
    assert!(body["data"]["id"].is_number());
}

#[tokio::test]
async fn test_member_cannot_create_roster() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_member_cannot_create_roster");

    common::login(&client, "member1@example.com", "admin").await;

    let response = client
        .post("/roster/create")
        .json(&json!({ "startDate": "2024-03-04", "endDate": "2024-03-10" }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Forbidden);
}

#[tokio::test]
async fn test_missing_dates_rejected() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_missing_dates_rejected");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/roster/create")
        .json(&json!({ "startDate": "2024-03-04" }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
}

#[tokio::test]
async fn test_malformed_date_rejected() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_malformed_date_rejected");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/roster/create")
        .json(&json!({ "startDate": "04/03/2024", "endDate": "2024-03-10" }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
}

#[tokio::test]
async fn test_end_before_start_rejected_and_nothing_created() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_end_before_start_rejected_and_nothing_created");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/roster/create")
        .json(&json!({ "startDate": "2024-03-10", "endDate": "2024-03-05" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert!(
        body["error"].as_str().unwrap().contains("End date"),
        "error should name the date-order problem"
    );

    // No roster row may exist after the rejection.
    let response = client.get("/roster/list").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let rosters: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(rosters.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_returns_team_rosters_newest_first() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_list_returns_team_rosters_newest_first");

    common::login(&client, "owner@example.com", "admin").await;
    let first = common::create_roster(&client, "2024-03-04", "2024-03-10").await;
    let second = common::create_roster(&client, "2024-03-11", "2024-03-17").await;

    let response = client.get("/roster/list").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let rosters: serde_json::Value = response.into_json().await.unwrap();
    let rosters = rosters.as_array().unwrap();
    assert_eq!(rosters.len(), 2);

    let ids: Vec<i64> = rosters.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert!(ids.contains(&(first as i64)));
    assert!(ids.contains(&(second as i64)));

    // Members of the same team see the same rosters.
    let member_client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    common::login(&member_client, "member1@example.com", "admin").await;
    let response = member_client.get("/roster/list").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}
