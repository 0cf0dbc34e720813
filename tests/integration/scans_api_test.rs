// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::helpers::{create_test_app, create_test_app_with_limit, random_id};

#[tokio::test]
async fn create_scan_returns_pending_job_immediately() {
    let app = create_test_app().await;
    app.mount_audit_runner(2, Duration::from_millis(200)).await;
    let site = app.create_site(true).await;

    let response = app
        .server
        .post("/scans")
        .json(&json!({ "site_id": site.id, "scan_type": "axe" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let scan = &response.json::<Value>()["scan"];
    assert_eq!(scan["site_id"], site.id.to_string());
    assert_eq!(scan["scan_type"], "axe");
    assert!(scan["status"] == "pending" || scan["status"] == "in_progress");
    assert!(scan.get("page_urls").is_none());
}

#[tokio::test]
async fn create_scan_validates_input() {
    let app = create_test_app().await;

    let missing = app.server.post("/scans").json(&json!({ "scan_type": "axe" })).await;
    missing.assert_status(StatusCode::BAD_REQUEST);

    let bad_type = app
        .server
        .post("/scans")
        .json(&json!({ "site_id": random_id(), "scan_type": "wave" }))
        .await;
    bad_type.assert_status(StatusCode::BAD_REQUEST);

    let unknown_site = app
        .server
        .post("/scans")
        .json(&json!({ "site_id": random_id(), "scan_type": "axe" }))
        .await;
    unknown_site.assert_status(StatusCode::NOT_FOUND);

    let no_sitemap = app.create_site(false).await;
    let response = app
        .server
        .post("/scans")
        .json(&json!({ "site_id": no_sitemap.id, "scan_type": "both" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rate_limit_denial_reports_remaining_and_reset_time() {
    let app = create_test_app_with_limit(2).await;
    app.mount_audit_runner(1, Duration::ZERO).await;
    let site = app.create_site(true).await;

    for _ in 0..2 {
        app.create_scan(json!({ "site_id": site.id, "scan_type": "axe" }))
            .await;
    }

    let response = app
        .server
        .post("/scans")
        .json(&json!({ "site_id": site.id, "scan_type": "axe" }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body = response.json::<Value>();
    assert_eq!(body["remaining"], 0);
    assert!(body["reset_time"].is_string());
    assert!(body["error"].is_string());

    let other_site = app.create_site(true).await;
    app.create_scan(json!({ "site_id": other_site.id, "scan_type": "axe" }))
        .await;
}

#[tokio::test]
async fn both_scan_costs_two_tokens() {
    let app = create_test_app_with_limit(3).await;
    app.mount_audit_runner(1, Duration::ZERO).await;
    let site = app.create_site(true).await;

    app.create_scan(json!({ "site_id": site.id, "scan_type": "both" }))
        .await;

    let response = app
        .server
        .post("/scans")
        .json(&json!({ "site_id": site.id, "scan_type": "both" }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["remaining"], 1);
}

#[tokio::test]
async fn cancel_is_not_idempotent() {
    let app = create_test_app().await;
    app.mount_audit_runner(5, Duration::from_secs(2)).await;
    let site = app.create_site(true).await;
    let scan = app
        .create_scan(json!({ "site_id": site.id, "scan_type": "axe" }))
        .await;
    let id = scan["id"].as_str().unwrap().to_string();

    let response = app.server.post(&format!("/scans/{}/cancel", id)).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["scan_id"], id);
    assert_eq!(body["status"], "cancelled");
    assert!(body["message"].is_string());

    let again = app.server.post(&format!("/scans/{}/cancel", id)).await;
    again.assert_status(StatusCode::BAD_REQUEST);

    let unknown = app
        .server
        .post(&format!("/scans/{}/cancel", random_id()))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);

    // the background task must not overwrite the cancellation
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let current = app.server.get(&format!("/scans/{}", id)).await.json::<Value>();
    assert_eq!(current["scan"]["status"], "cancelled");
    let violations = app
        .server
        .get(&format!("/scans/{}/violations", id))
        .await
        .json::<Value>();
    assert_eq!(violations["violations"], json!([]));
}

#[tokio::test]
async fn unknown_scan_is_404_everywhere() {
    let app = create_test_app().await;
    let id = random_id();

    for uri in [
        format!("/scans/{}", id),
        format!("/scans/{}/progress", id),
        format!("/scans/{}/violations", id),
    ] {
        app.server.get(&uri).await.assert_status(StatusCode::NOT_FOUND);
    }
    app.server
        .post(&format!("/scans/{}/resume", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_rejects_unknown_status_filter() {
    let app = create_test_app().await;

    let response = app.server.get("/scans").add_query_param("status", "exploded").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let empty = app.server.get("/scans").await;
    empty.assert_status_ok();
    assert_eq!(empty.json::<Value>(), json!([]));
}

#[tokio::test]
async fn resume_requires_paused_and_restart_excludes_index() {
    let app = create_test_app().await;
    app.mount_audit_runner(1, Duration::ZERO).await;
    let site = app.create_site(true).await;
    let scan = app
        .create_scan(json!({ "site_id": site.id, "scan_type": "axe" }))
        .await;
    let id = scan["id"].as_str().unwrap().to_string();
    app.wait_for_status(&id, &["completed"]).await;

    let resume = app.server.post(&format!("/scans/{}/resume", id)).await;
    resume.assert_status(StatusCode::BAD_REQUEST);

    let both = app
        .server
        .post(&format!("/scans/{}/resume", id))
        .json(&json!({ "restart": true, "resume_from_index": 0 }))
        .await;
    both.assert_status(StatusCode::BAD_REQUEST);

    let restart = app
        .server
        .post(&format!("/scans/{}/resume", id))
        .json(&json!({ "restart": true }))
        .await;
    restart.assert_status(StatusCode::ACCEPTED);
    let restarted = &restart.json::<Value>()["scan"];
    assert_eq!(restarted["status"], "pending");
    assert_eq!(restarted["pages_scanned"], 0);
    assert_eq!(restarted["resume_index"], 0);

    let done = app.wait_for_status(&id, &["completed"]).await;
    assert_eq!(done["pages_scanned"], 1);
}
