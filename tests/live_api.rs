//! Tests against a running server backed by PostgreSQL

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// ISBN unlikely to collide with data left behind by earlier runs
fn fresh_isbn() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{:013}", nanos.rem_euclid(10_000_000_000_000))
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "SQL in Action",
            "author": "Craig Walls",
            "isbn": fresh_isbn(),
            "publicationYear": 2021
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available"], true);
    let book_id = body["id"].as_i64().expect("No book ID");

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_duplicate_creates() {
    let client = Client::new();
    let isbn = fresh_isbn();

    let requests = (0..5).map(|i| {
        let client = client.clone();
        let isbn = isbn.clone();
        async move {
            client
                .post(format!("{}/books", BASE_URL))
                .json(&json!({
                    "title": format!("Race {}", i),
                    "author": "Racer",
                    "isbn": isbn,
                    "publicationYear": 2020
                }))
                .send()
                .await
                .expect("Failed to send request")
                .status()
        }
    });

    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.expect("task panicked"));
    }

    assert_eq!(statuses.iter().filter(|s| s.as_u16() == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|s| s.as_u16() == 409).count(), 4);
}
