// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use super::helpers::{axe_body, create_test_app};

#[tokio::test]
async fn both_scan_runs_to_completion_and_persists_violations() {
    let app = create_test_app().await;
    app.mount_audit_runner(2, Duration::ZERO).await;
    let site = app.create_site(true).await;

    let scan = app
        .create_scan(json!({ "site_id": site.id, "scan_type": "both" }))
        .await;
    let id = scan["id"].as_str().unwrap().to_string();

    let done = app.wait_for_status(&id, &["completed", "failed"]).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["pages_total"], 4);
    assert_eq!(done["pages_scanned"], 4);
    assert_eq!(done["axe_score"], 90);
    assert_eq!(done["lighthouse_score"], 85);
    assert_eq!(done["total_violations_sum"], 6);
    assert_eq!(done["worst_page_url"], app.page_urls(2)[0]);
    assert_eq!(done["worst_page_violation_count"], 2);
    assert!(done["completed_at"].is_string());

    let violations = app
        .server
        .get(&format!("/scans/{}/violations", id))
        .await
        .json::<Value>();
    let violations = violations["violations"].as_array().unwrap().clone();
    assert_eq!(violations.len(), 6);
    let pages = app.page_urls(2);
    assert!(violations
        .iter()
        .all(|v| pages.iter().any(|p| v["page_url"] == p.as_str())));
    let contrast = violations
        .iter()
        .find(|v| v["rule_id"] == "color-contrast")
        .unwrap();
    assert_eq!(contrast["engine"], "lighthouse");
    assert_eq!(contrast["impact"], "serious");
    assert_eq!(contrast["element_count"], 3);

    let progress = app
        .server
        .get(&format!("/scans/{}/progress", id))
        .await
        .json::<Value>();
    let progress = progress["progress"].as_array().unwrap().clone();
    assert!(progress.iter().any(|m| m.as_str().unwrap().starts_with("[axe]")));
    assert!(progress
        .iter()
        .any(|m| m.as_str().unwrap().contains("Scan completed")));

    let list = app.server.get("/scans").add_query_param("status", "completed").await;
    let list = list.json::<Value>();
    assert_eq!(list[0]["id"], id);
    assert_eq!(list[0]["site_name"], "Example Shop");
}

#[tokio::test]
async fn single_page_scan_skips_sitemap() {
    let app = create_test_app().await;
    app.mount_audit_runner(0, Duration::ZERO).await;
    let site = app.create_site(false).await;
    let page = format!("{}/landing", app.audit_runner.uri());

    let scan = app
        .create_scan(json!({ "site_id": site.id, "scan_type": "both", "page_url": page }))
        .await;
    let id = scan["id"].as_str().unwrap().to_string();

    let done = app.wait_for_status(&id, &["completed", "failed"]).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["pages_total"], 2);
    assert_eq!(done["page_url"], page);
    assert_eq!(done["axe_score"], 90);
    assert_eq!(done["lighthouse_score"], 85);
}

#[tokio::test]
async fn single_page_scan_survives_one_engine_failure() {
    let app = create_test_app().await;
    Mock::given(method("POST"))
        .and(path("/axe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(axe_body()))
        .mount(&app.audit_runner)
        .await;
    Mock::given(method("POST"))
        .and(path("/lighthouse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.audit_runner)
        .await;
    let site = app.create_site(false).await;

    let scan = app
        .create_scan(json!({
            "site_id": site.id,
            "scan_type": "both",
            "page_url": format!("{}/landing", app.audit_runner.uri()),
        }))
        .await;
    let id = scan["id"].as_str().unwrap().to_string();

    let done = app.wait_for_status(&id, &["completed", "failed"]).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["axe_score"], 90);
    assert!(done["lighthouse_score"].is_null());
}

#[tokio::test]
async fn unreachable_sitemap_fails_the_job() {
    let app = create_test_app().await;
    let site = app.create_site(true).await;

    let scan = app
        .create_scan(json!({ "site_id": site.id, "scan_type": "axe" }))
        .await;
    let id = scan["id"].as_str().unwrap().to_string();

    let failed = app.wait_for_status(&id, &["failed", "completed"]).await;

    assert_eq!(failed["status"], "failed");
    assert!(failed["error_message"]
        .as_str()
        .unwrap()
        .contains("sitemap.xml"));
}
