//! Organizations, invitations and membership

use serde_json::json;

use property_inventory::services::MailKind;

use crate::common::{ItemFactory, TestApp};

#[tokio::test]
async fn test_admin_owns_at_most_one_organization() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;

    app.post(
        "/api/v1/organization",
        admin.token(),
        json!({ "name": "Second" }),
    )
    .await
    .assert_conflict();
}

#[tokio::test]
async fn test_employee_cannot_create_organization() {
    let app = TestApp::new().await;
    let employee = app.employee().await;

    app.post(
        "/api/v1/organization",
        employee.token(),
        json!({ "name": "Rogue" }),
    )
    .await
    .assert_unauthorized();
}

#[tokio::test]
async fn test_update_organization() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;

    let response = app
        .put(
            "/api/v1/organization",
            admin.token(),
            json!({ "name": "Acme Renamed" }),
        )
        .await;

    response.assert_ok();
    let body = response.value();
    assert_eq!(body["name"], "Acme Renamed");
    assert_eq!(body["description"], "Warehouse operator");
}

#[tokio::test]
async fn test_invitation_accept_joins_organization() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let organization_id = app.organization(&admin).await;
    let employee = app.employee().await;

    let invitation_id = app.invite(&admin, &employee).await;
    assert!(app
        .mailer
        .messages()
        .iter()
        .any(|m| m.to == employee.email && m.kind == MailKind::Invitation));

    let pending = app.get("/api/v1/invitations", employee.token()).await;
    pending.assert_ok();
    let pending: Vec<serde_json::Value> = pending.json();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["organization_name"], "Acme Logistics");

    let response = app
        .post_empty(
            &format!("/api/v1/invitations/{}/accept", invitation_id),
            employee.token(),
        )
        .await;
    response.assert_ok();
    assert_eq!(response.value()["id"], organization_id);

    let me = app.get("/api/v1/me", employee.token()).await.value();
    assert_eq!(me["organization_id"], organization_id);

    let organization = app.get("/api/v1/organization", employee.token()).await;
    organization.assert_ok();
    assert_eq!(organization.value()["id"], organization_id);

    // Accepting consumes every invitation of the employee
    let remaining: Vec<serde_json::Value> = app
        .get("/api/v1/invitations", employee.token())
        .await
        .json();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_invite_unknown_email_is_not_found() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;

    app.post(
        "/api/v1/organization/invitations",
        admin.token(),
        json!({ "email": "nobody@example.com" }),
    )
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_duplicate_invitation_and_member_invite_conflict() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;
    let employee = app.employee().await;
    app.invite(&admin, &employee).await;

    app.post(
        "/api/v1/organization/invitations",
        admin.token(),
        json!({ "email": employee.email }),
    )
    .await
    .assert_conflict();

    let tenant = app.tenant().await;
    app.post(
        "/api/v1/organization/invitations",
        admin.token(),
        json!({ "email": tenant.employee.email }),
    )
    .await
    .assert_conflict();
}

#[tokio::test]
async fn test_invitation_for_someone_else_cannot_be_accepted() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;
    let invited = app.employee().await;
    let intruder = app.employee().await;
    let invitation_id = app.invite(&admin, &invited).await;

    app.post_empty(
        &format!("/api/v1/invitations/{}/accept", invitation_id),
        intruder.token(),
    )
    .await
    .assert_unauthorized();
}

#[tokio::test]
async fn test_decline_and_cancel_invitations() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;
    let first = app.employee().await;
    let second = app.employee().await;

    let declined = app.invite(&admin, &first).await;
    app.post_empty(
        &format!("/api/v1/invitations/{}/decline", declined),
        first.token(),
    )
    .await
    .assert_no_content();

    let cancelled = app.invite(&admin, &second).await;
    app.delete(
        &format!("/api/v1/organization/invitations/{}", cancelled),
        admin.token(),
    )
    .await
    .assert_no_content();

    let sent: Vec<serde_json::Value> = app
        .get("/api/v1/organization/invitations", admin.token())
        .await
        .json();
    assert!(sent.is_empty());
}

#[tokio::test]
async fn test_cancel_invitation_of_other_organization_is_not_found() {
    let app = TestApp::new().await;
    let tenant_admin = app.admin().await;
    app.organization(&tenant_admin).await;
    let other_admin = app.admin().await;
    app.organization(&other_admin).await;
    let employee = app.employee().await;
    let invitation_id = app.invite(&tenant_admin, &employee).await;

    app.delete(
        &format!("/api/v1/organization/invitations/{}", invitation_id),
        other_admin.token(),
    )
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_list_and_remove_employees() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    let response = app
        .get("/api/v1/organization/employees", tenant.admin.token())
        .await;
    response.assert_ok();
    let page = response.value();
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["id"], tenant.employee.id);

    app.delete(
        &format!("/api/v1/organization/employees/{}", tenant.employee.id),
        tenant.admin.token(),
    )
    .await
    .assert_no_content();

    let me = app.get("/api/v1/me", tenant.employee.token()).await.value();
    assert!(me.get("organization_id").is_none());
}

#[tokio::test]
async fn test_leaving_clears_item_assignments() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let items = app
        .create_items(
            &tenant.admin,
            vec![ItemFactory::assigned_to(&tenant.employee.id)],
        )
        .await;
    assert_eq!(items[0]["employee_id"], tenant.employee.id);

    let response = app
        .post_empty("/api/v1/organization/leave", tenant.employee.token())
        .await;
    response.assert_ok();

    let item = app
        .get(
            &format!("/api/v1/property/items/{}", items[0]["id"].as_str().unwrap()),
            tenant.admin.token(),
        )
        .await
        .value();
    assert!(item["employee_id"].is_null());

    // Not a member any more
    app.post_empty("/api/v1/organization/leave", tenant.employee.token())
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_delete_organization_detaches_employees() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    app.delete("/api/v1/organization", tenant.admin.token())
        .await
        .assert_no_content();

    app.get("/api/v1/organization", tenant.admin.token())
        .await
        .assert_bad_request();
    let me = app.get("/api/v1/me", tenant.employee.token()).await.value();
    assert!(me.get("organization_id").is_none());
}
