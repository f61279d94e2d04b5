#[macro_use]
extern crate time_test;

use std::sync::Arc;
use std::time::Duration;

use rocket::http::Status;
use rocket::local::asynchronous::Client;
use rocket::tokio;
use serde_json::json;

use rosta_api::generation::client::{GenerationError, StubGenerator};
use rosta_api::orm::testing::test_rocket_with_generator;

mod common;

/// Polls the job status endpoint until the job reaches a terminal state.
async fn wait_for_terminal(client: &Client, task_id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let response = client
            .get(format!("/trigger/roster-generation/{}", task_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.unwrap();
        match body["state"].as_str() {
            Some("succeeded") | Some("failed") => return body,
            _ => {}
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", task_id);
}

fn generation_payload(roster_id: i32) -> serde_json::Value {
    json!({
        "roster": { "id": roster_id, "startDate": "2024-03-04", "endDate": "2024-03-10" },
        "availability": [
            { "userId": 1, "date": "2024-03-04", "isAvailableAM": true }
        ]
    })
}

#[tokio::test]
async fn test_trigger_full_pipeline_persists_shifts() {
    let stub = Arc::new(StubGenerator::with_sequence(vec![]));
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(
        stub.clone(),
    ))
    .await
    .unwrap();
    time_test!("test_trigger_full_pipeline_persists_shifts");

    let owner_id = common::login(&client, "owner@example.com", "admin").await;
    let roster_id = common::create_roster(&client, "2024-03-04", "2024-03-10").await;

    let batch = json!([
        common::shift_record(roster_id, owner_id, "2024-03-04", json!(8)),
        common::shift_record(roster_id, owner_id, "2024-03-05", json!(6.5)),
    ]);
    stub.push(Ok(format!("```json\n{}\n```", batch)));

    let response = client
        .post("/trigger/roster-generation")
        .json(&generation_payload(roster_id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    let task_id = body["taskId"].as_str().unwrap().to_string();
    assert_eq!(body["message"], "Roster generation task queued successfully");

    let record = wait_for_terminal(&client, &task_id).await;
    assert_eq!(record["state"], "succeeded");
    assert_eq!(record["shiftsPersisted"], 2);
    assert_eq!(record["attempts"], 1);
    assert_eq!(record["kind"], "generate-and-persist");

    let response = client
        .get(format!("/roster/shifts_by_team?rosterId={}", roster_id))
        .dispatch()
        .await;
    let body: serde_json::Value = response.into_json().await.unwrap();
    let shifts = body["shifts"].as_array().unwrap();
    assert_eq!(shifts.len(), 2);
    assert_eq!(shifts[1]["hours"], "6.50");
}

#[tokio::test]
async fn test_sync_generate_returns_shifts_and_queues_persistence() {
    let stub = Arc::new(StubGenerator::with_sequence(vec![]));
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(
        stub.clone(),
    ))
    .await
    .unwrap();
    time_test!("test_sync_generate_returns_shifts_and_queues_persistence");

    let owner_id = common::login(&client, "owner@example.com", "admin").await;
    let roster_id = common::create_roster(&client, "2024-03-04", "2024-03-10").await;

    let batch = json!([
        common::shift_record(roster_id, owner_id, "2024-03-06", json!(8)),
    ]);
    stub.push(Ok(batch.to_string()));

    let response = client
        .post("/roster/generate")
        .json(&generation_payload(roster_id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["shifts"].as_array().unwrap().len(), 1);

    let job_id = body["jobId"].as_str().unwrap().to_string();
    let record = wait_for_terminal(&client, &job_id).await;
    assert_eq!(record["state"], "succeeded");
    assert_eq!(record["kind"], "persist-shifts");
    assert_eq!(record["shiftsPersisted"], 1);
}

#[tokio::test]
async fn test_sync_generate_surfaces_raw_output_on_parse_failure() {
    let stub = Arc::new(StubGenerator::with_response("I would rather not."));
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(stub))
        .await
        .unwrap();
    time_test!("test_sync_generate_surfaces_raw_output_on_parse_failure");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/roster/generate")
        .json(&generation_payload(1))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON"));
    // The raw cleaned text is preserved for diagnosis.
    assert_eq!(body["details"], "I would rather not.");
}

#[tokio::test]
async fn test_malformed_output_fails_terminally_without_retry() {
    let stub = Arc::new(StubGenerator::with_response("schedule: none today"));
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(stub))
        .await
        .unwrap();
    time_test!("test_malformed_output_fails_terminally_without_retry");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/trigger/roster-generation")
        .json(&generation_payload(1))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    let task_id = body["taskId"].as_str().unwrap().to_string();

    let record = wait_for_terminal(&client, &task_id).await;
    assert_eq!(record["state"], "failed");
    assert_eq!(record["terminal"], true);
    assert_eq!(record["attempts"], 1, "malformed output is never retried");
    assert!(
        record["error"].as_str().unwrap().contains("schedule: none today"),
        "raw model output must survive into the job error"
    );
}

#[tokio::test]
async fn test_unavailable_service_exhausts_retries() {
    let stub = Arc::new(StubGenerator::with_sequence(vec![Err(
        GenerationError::Unavailable("connection refused".to_string()),
    )]));
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(stub))
        .await
        .unwrap();
    time_test!("test_unavailable_service_exhausts_retries");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/trigger/roster-generation")
        .json(&generation_payload(1))
        .dispatch()
        .await;
    let body: serde_json::Value = response.into_json().await.unwrap();
    let task_id = body["taskId"].as_str().unwrap().to_string();

    let record = wait_for_terminal(&client, &task_id).await;
    assert_eq!(record["state"], "failed");
    assert_eq!(record["terminal"], false);
    // Test rockets run with max_attempts = 2.
    assert_eq!(record["attempts"], 2);
    assert!(record["error"].as_str().unwrap().contains("retries exhausted"));
}

#[tokio::test]
async fn test_duplicate_generation_for_populated_roster_rejected() {
    let stub = Arc::new(StubGenerator::with_sequence(vec![]));
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(
        stub.clone(),
    ))
    .await
    .unwrap();
    time_test!("test_duplicate_generation_for_populated_roster_rejected");

    let owner_id = common::login(&client, "owner@example.com", "admin").await;
    let roster_id = common::create_roster(&client, "2024-03-04", "2024-03-10").await;

    // Populate the roster directly.
    let response = client
        .post("/roster/shifts")
        .json(&json!([
            common::shift_record(roster_id, owner_id, "2024-03-04", json!(8)),
        ]))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // A generation job for the same roster must not double-insert.
    stub.push(Ok(json!([
        common::shift_record(roster_id, owner_id, "2024-03-05", json!(8)),
    ])
    .to_string()));

    let response = client
        .post("/trigger/roster-generation")
        .json(&generation_payload(roster_id))
        .dispatch()
        .await;
    let body: serde_json::Value = response.into_json().await.unwrap();
    let task_id = body["taskId"].as_str().unwrap().to_string();

    let record = wait_for_terminal(&client, &task_id).await;
    assert_eq!(record["state"], "failed");
    assert_eq!(record["terminal"], true);
    assert!(record["error"].as_str().unwrap().contains("already has shifts"));

    // Only the original shift remains.
    let response = client
        .get(format!("/roster/shifts_by_team?rosterId={}", roster_id))
        .dispatch()
        .await;
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert_eq!(body["shifts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_payload_rejected() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(
        Arc::new(StubGenerator::with_response("[]")),
    ))
    .await
    .unwrap();
    time_test!("test_missing_payload_rejected");

    common::login(&client, "owner@example.com", "admin").await;

    let response = client
        .post("/trigger/roster-generation")
        .json(&json!({ "roster": { "id": 1 } }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[tokio::test]
async fn test_unknown_task_id_is_not_found() {
    let client = rocket::local::asynchronous::Client::tracked(test_rocket_with_generator(
        Arc::new(StubGenerator::with_response("[]")),
    ))
    .await
    .unwrap();
    time_test!("test_unknown_task_id_is_not_found");

    common::login(&client, "owner@example.com", "admin").await;

    for id in ["not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
        let response = client
            .get(format!("/trigger/roster-generation/{}", id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
