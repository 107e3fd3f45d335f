//! Background cleanup sweeps against a populated database

use std::time::Duration;

use serde_json::{json, Value};

use property_inventory::config::CleanupConfig;
use property_inventory::services::{run_cleanup_pass, CleanupReport};

use crate::common::{ItemFactory, TestApp};

fn immediate() -> CleanupConfig {
    CleanupConfig {
        suggestion_retention_days: 0,
        invitation_expiry_days: 0,
        ..CleanupConfig::default()
    }
}

#[tokio::test]
async fn test_default_retention_keeps_fresh_rows() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let suggestion = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    app.post_empty(
        &format!(
            "/api/v1/property/suggestions/{}/decline",
            suggestion["id"].as_str().unwrap()
        ),
        tenant.admin.token(),
    )
    .await
    .assert_ok();

    let report = run_cleanup_pass(&app.state.db, &CleanupConfig::default())
        .await
        .unwrap();

    assert_eq!(report, CleanupReport::default());
}

#[tokio::test]
async fn test_closed_suggestions_are_removed_pending_kept() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let closed = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    let pending = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    app.post_empty(
        &format!(
            "/api/v1/property/suggestions/{}/accept",
            closed["id"].as_str().unwrap()
        ),
        tenant.admin.token(),
    )
    .await
    .assert_ok();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let report = run_cleanup_pass(&app.state.db, &immediate()).await.unwrap();

    assert_eq!(report.suggestions, 1);
    let remaining = app
        .get("/api/v1/property/suggestions", tenant.admin.token())
        .await
        .value();
    assert_eq!(remaining["total"], 1);
    assert_eq!(remaining["data"][0]["id"], pending["id"]);

    // Items created by the approved suggestion stay
    let items = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(items["total"], 1);
}

#[tokio::test]
async fn test_stale_invitations_expire() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;
    let employee = app.employee().await;
    app.invite(&admin, &employee).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let report = run_cleanup_pass(&app.state.db, &immediate()).await.unwrap();

    assert_eq!(report.invitations, 1);
    let pending: Vec<Value> = app.get("/api/v1/invitations", employee.token()).await.json();
    assert!(pending.is_empty());
}
