//! Suggestion approval workflow

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{ItemFactory, TestApp};

fn suggestion_uri(suggestion: &Value, action: &str) -> String {
    let id = suggestion["id"].as_str().unwrap();
    if action.is_empty() {
        format!("/api/v1/property/suggestions/{}", id)
    } else {
        format!("/api/v1/property/suggestions/{}/{}", id, action)
    }
}

#[tokio::test]
async fn test_employee_suggests_and_admin_accepts() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    let suggestion = app
        .suggest(
            &tenant.employee,
            "create",
            json!([
                ItemFactory::with_inventory_number("SUG-1"),
                ItemFactory::with_inventory_number("SUG-2"),
            ]),
        )
        .await;
    assert_eq!(suggestion["status"], "pending");
    assert_eq!(suggestion["request_type"], "create");
    assert_eq!(suggestion["employee_id"], tenant.employee.id);
    assert_eq!(suggestion["version"], 0);

    // Nothing is applied before the decision
    let page = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(page["total"], 0);

    let response = app
        .post_empty(&suggestion_uri(&suggestion, "accept"), tenant.admin.token())
        .await;
    response.assert_ok();
    let accepted = response.value();
    assert_eq!(accepted["status"], "approved");
    assert_eq!(accepted["version"], 1);

    let page = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(page["total"], 2);

    app.post_empty(&suggestion_uri(&suggestion, "accept"), tenant.admin.token())
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_accepted_update_and_delete_suggestions_apply() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let items = app.create_items(&tenant.admin, ItemFactory::batch(2)).await;
    let first = items[0]["id"].as_str().unwrap();
    let second = items[1]["id"].as_str().unwrap();

    let update = app
        .suggest(
            &tenant.employee,
            "update",
            json!([{ "id": first, "location": "Loading dock" }]),
        )
        .await;
    app.post_empty(&suggestion_uri(&update, "accept"), tenant.admin.token())
        .await
        .assert_ok();
    let item = app
        .get(
            &format!("/api/v1/property/items/{}", first),
            tenant.admin.token(),
        )
        .await
        .value();
    assert_eq!(item["location"], "Loading dock");

    let delete = app.suggest(&tenant.employee, "delete", json!([second])).await;
    app.post_empty(&suggestion_uri(&delete, "accept"), tenant.admin.token())
        .await
        .assert_ok();
    app.get(
        &format!("/api/v1/property/items/{}", second),
        tenant.admin.token(),
    )
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_failed_replay_leaves_suggestion_pending() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let suggestion = app
        .suggest(
            &tenant.employee,
            "create",
            json!([ItemFactory::with_inventory_number("CLASH-1")]),
        )
        .await;
    app.create_items(
        &tenant.admin,
        vec![ItemFactory::with_inventory_number("CLASH-1")],
    )
    .await;

    app.post_empty(&suggestion_uri(&suggestion, "accept"), tenant.admin.token())
        .await
        .assert_conflict();

    let current = app
        .get(&suggestion_uri(&suggestion, ""), tenant.admin.token())
        .await
        .value();
    assert_eq!(current["status"], "pending");
    assert_eq!(current["version"], 0);
    let page = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn test_decline_with_and_without_feedback() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let with_feedback = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    let without_feedback = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;

    let response = app
        .post(
            &suggestion_uri(&with_feedback, "decline"),
            tenant.admin.token(),
            json!({ "feedback": "  Already on the list  " }),
        )
        .await;
    response.assert_ok();
    let declined = response.value();
    assert_eq!(declined["status"], "declined");
    assert_eq!(declined["feedback"], "Already on the list");

    let response = app
        .post_empty(
            &suggestion_uri(&without_feedback, "decline"),
            tenant.admin.token(),
        )
        .await;
    response.assert_ok();
    assert!(response.value()["feedback"].is_null());

    app.post_empty(
        &suggestion_uri(&without_feedback, "accept"),
        tenant.admin.token(),
    )
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_decline_feedback_is_bounded() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let suggestion = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;

    let response = app
        .post(
            &suggestion_uri(&suggestion, "decline"),
            tenant.admin.token(),
            json!({ "feedback": "x".repeat(501) }),
        )
        .await;

    response.assert_bad_request();
    assert!(response.value()["errors"]["feedback"].is_array());
}

#[tokio::test]
async fn test_invalid_suggestion_payloads() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    app.post(
        "/api/v1/property/suggestions",
        tenant.employee.token(),
        json!({ "request_type": "create", "request_body": [] }),
    )
    .await
    .assert_bad_request();
    app.post(
        "/api/v1/property/suggestions",
        tenant.employee.token(),
        json!({ "request_type": "rename", "request_body": [] }),
    )
    .await
    .assert_bad_request();
    app.post(
        "/api/v1/property/suggestions",
        tenant.employee.token(),
        json!({ "request_type": "delete", "request_body": [{ "name": "Desk" }] }),
    )
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_admin_cannot_suggest() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    app.post(
        "/api/v1/property/suggestions",
        tenant.admin.token(),
        json!({ "request_type": "create", "request_body": [ItemFactory::create()] }),
    )
    .await
    .assert_unauthorized();
}

#[tokio::test]
async fn test_employees_only_see_their_own_suggestions() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let colleague = app.employee().await;
    app.join(&tenant.admin, &colleague).await;

    let own = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    app.suggest(&colleague, "create", json!([ItemFactory::create()]))
        .await;

    let mine = app
        .get("/api/v1/property/suggestions", tenant.employee.token())
        .await
        .value();
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["data"][0]["id"], own["id"]);

    let all = app
        .get("/api/v1/property/suggestions", tenant.admin.token())
        .await
        .value();
    assert_eq!(all["total"], 2);

    app.get(&suggestion_uri(&own, ""), colleague.token())
        .await
        .assert_unauthorized();

    let pending = app
        .get(
            "/api/v1/property/suggestions?status=approved",
            tenant.admin.token(),
        )
        .await
        .value();
    assert_eq!(pending["total"], 0);
}

#[tokio::test]
async fn test_employee_withdraws_own_suggestion() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let colleague = app.employee().await;
    app.join(&tenant.admin, &colleague).await;
    let suggestion = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;

    app.delete(&suggestion_uri(&suggestion, ""), colleague.token())
        .await
        .assert_unauthorized();
    app.delete(&suggestion_uri(&suggestion, ""), tenant.employee.token())
        .await
        .assert_no_content();
    app.get(&suggestion_uri(&suggestion, ""), tenant.admin.token())
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_approved_suggestion_cannot_be_withdrawn() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let suggestion = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    app.post_empty(&suggestion_uri(&suggestion, "accept"), tenant.admin.token())
        .await
        .assert_ok();

    app.delete(&suggestion_uri(&suggestion, ""), tenant.employee.token())
        .await
        .assert_unauthorized();
    app.delete(&suggestion_uri(&suggestion, ""), tenant.admin.token())
        .await
        .assert_no_content();
}

#[tokio::test]
async fn test_admin_deletes_pending_and_declined_suggestions() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let pending = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    let declined = app
        .suggest(&tenant.employee, "create", json!([ItemFactory::create()]))
        .await;
    app.post_empty(&suggestion_uri(&declined, "decline"), tenant.admin.token())
        .await
        .assert_ok();

    for suggestion in [&pending, &declined] {
        app.delete(&suggestion_uri(suggestion, ""), tenant.admin.token())
            .await
            .assert_no_content();
        app.get(&suggestion_uri(suggestion, ""), tenant.admin.token())
            .await
            .assert_not_found();
    }

    let remaining = app
        .get("/api/v1/property/suggestions", tenant.admin.token())
        .await
        .value();
    assert_eq!(remaining["total"], 0);
    let items = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(items["total"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accepts_apply_once() {
    let app = Arc::new(TestApp::new().await);
    let tenant = app.tenant().await;
    let suggestion = app
        .suggest(
            &tenant.employee,
            "create",
            json!([
                ItemFactory::with_inventory_number("RACE-1"),
                ItemFactory::with_inventory_number("RACE-2"),
            ]),
        )
        .await;
    let uri = suggestion_uri(&suggestion, "accept");

    let attempts: Vec<_> = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            let uri = uri.clone();
            let token = tenant.admin.token.clone();
            tokio::spawn(async move { app.post_empty(&uri, Some(&token)).await.status })
        })
        .collect();
    let mut statuses = Vec::new();
    for attempt in attempts {
        statuses.push(attempt.await.unwrap());
    }

    let accepted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(accepted, 1, "statuses: {:?}", statuses);
    assert!(
        statuses.iter().all(|s| matches!(
            *s,
            StatusCode::OK | StatusCode::CONFLICT | StatusCode::BAD_REQUEST
        )),
        "statuses: {:?}",
        statuses
    );

    let current = app
        .get(&suggestion_uri(&suggestion, ""), tenant.admin.token())
        .await
        .value();
    assert_eq!(current["status"], "approved");
    assert_eq!(current["version"], 1);
    let items = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(items["total"], 2);
}
