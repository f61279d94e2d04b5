#[macro_use]
extern crate time_test;

use rocket::http::Status;
use rocket::tokio;
use serde_json::json;

use rosta_api::orm::testing::test_rocket;

mod common;

#[tokio::test]
async fn test_login_success() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_login_success");

    let response = client
        .post("/login")
        .json(&json!({
            "email": "owner@example.com",
            "password": "admin"
        }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    assert!(response.cookies().get("session").is_some());

    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["email"], "owner@example.com");
    assert_eq!(body["role"], "owner");
    assert!(body["userId"].is_number());
    assert_eq!(body["teamName"], "Test Team");
}

#[tokio::test]
async fn test_wrong_email() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_wrong_email");

    let response = client
        .post("/login")
        .json(&json!({
            "email": "nonexistent@example.com",
            "password": "admin"
        }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Unauthorized);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_wrong_password() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_wrong_password");

    let response = client
        .post("/login")
        .json(&json!({
            "email": "owner@example.com",
            "password": "wrong_password"
        }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Unauthorized);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_empty_credentials_are_bad_requests() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_empty_credentials_are_bad_requests");

    for body in [
        json!({ "email": "", "password": "admin" }),
        json!({ "email": "owner@example.com", "password": "" }),
    ] {
        let response = client.post("/login").json(&body).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_protected_routes_require_session");

    let response = client.get("/roster/list").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_logout_revokes_session");

    common::login(&client, "owner@example.com", "admin").await;
    let response = client.get("/roster/list").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let response = client.post("/logout").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let response = client.get("/roster/list").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn test_status_endpoint_is_public() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket())
        .await
        .unwrap();
    time_test!("test_status_endpoint_is_public");

    let response = client.get("/status").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["status"], "running");
}
