//! Property and item management

use rstest::rstest;
use serde_json::{json, Value};

use crate::common::{ItemFactory, TestApp};

#[tokio::test]
async fn test_property_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.organization(&admin).await;

    app.get("/api/v1/property", admin.token())
        .await
        .assert_bad_request();

    let property_id = app.property(&admin).await;
    app.post(
        "/api/v1/property",
        admin.token(),
        json!({ "name": "Another" }),
    )
    .await
    .assert_conflict();

    let response = app
        .put(
            "/api/v1/property",
            admin.token(),
            json!({ "description": "Ground floor and yard" }),
        )
        .await;
    response.assert_ok();
    let body = response.value();
    assert_eq!(body["id"], property_id);
    assert_eq!(body["name"], "Main warehouse");
    assert_eq!(body["description"], "Ground floor and yard");

    app.delete("/api/v1/property", admin.token())
        .await
        .assert_no_content();
    app.get("/api/v1/property", admin.token())
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_members_can_read_property() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    let response = app.get("/api/v1/property", tenant.employee.token()).await;
    response.assert_ok();
    assert_eq!(response.value()["id"], tenant.property_id);

    app.put(
        "/api/v1/property",
        tenant.employee.token(),
        json!({ "name": "Hijacked" }),
    )
    .await
    .assert_unauthorized();
}

#[tokio::test]
async fn test_create_items_batch() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    let items = app
        .create_items(&tenant.admin, ItemFactory::batch(3))
        .await;

    assert_eq!(items.len(), 3);
    for item in &items {
        assert_eq!(item["property_id"], tenant.property_id);
        assert_eq!(item["scan_status"], "not_scanned");
    }

    let page = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(page["total"], 3);
}

#[tokio::test]
async fn test_duplicate_identifier_rolls_back_whole_batch() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    let response = app
        .post(
            "/api/v1/property/items",
            tenant.admin.token(),
            json!([
                ItemFactory::with_inventory_number("INV-DUP"),
                ItemFactory::create(),
                ItemFactory::with_inventory_number("INV-DUP"),
            ]),
        )
        .await;

    response.assert_conflict();
    let page = app
        .get("/api/v1/property/items", tenant.admin.token())
        .await
        .value();
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_identifier_conflicts_with_existing_item() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let mut existing = ItemFactory::create();
    existing["serial_number"] = json!("SN-1");
    app.create_items(&tenant.admin, vec![existing]).await;

    let mut clash = ItemFactory::create();
    clash["serial_number"] = json!("SN-1");
    app.post(
        "/api/v1/property/items",
        tenant.admin.token(),
        json!([clash]),
    )
    .await
    .assert_conflict();
}

#[rstest]
#[case::empty_batch(json!([]))]
#[case::blank_name(json!([{ "name": " ", "inventory_number": "INV-1" }]))]
#[case::bad_identifier(json!([{ "name": "Desk", "inventory_number": "-bad id" }]))]
#[case::negative_price(json!([{ "name": "Desk", "inventory_number": "INV-2", "price": -1.0 }]))]
#[tokio::test]
async fn test_invalid_item_batches_are_rejected(#[case] body: Value) {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    app.post("/api/v1/property/items", tenant.admin.token(), body)
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_assignee_must_be_member() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let outsider = app.employee().await;

    app.post(
        "/api/v1/property/items",
        tenant.admin.token(),
        json!([ItemFactory::assigned_to(&outsider.id)]),
    )
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_employees_cannot_write_items_directly() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    app.post(
        "/api/v1/property/items",
        tenant.employee.token(),
        json!([ItemFactory::create()]),
    )
    .await
    .assert_unauthorized();
}

#[tokio::test]
async fn test_update_and_unassign_items() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let items = app
        .create_items(
            &tenant.admin,
            vec![ItemFactory::assigned_to(&tenant.employee.id)],
        )
        .await;
    let id = items[0]["id"].as_str().unwrap();

    let response = app
        .put(
            "/api/v1/property/items",
            tenant.admin.token(),
            json!([{ "id": id, "location": "Shelf B", "price": 12.5 }]),
        )
        .await;
    response.assert_ok();
    let updated: Vec<Value> = response.json();
    assert_eq!(updated[0]["location"], "Shelf B");
    assert_eq!(updated[0]["price"], 12.5);
    assert_eq!(updated[0]["employee_id"], tenant.employee.id);

    let response = app
        .put(
            "/api/v1/property/items",
            tenant.admin.token(),
            json!([{ "id": id, "unassign_employee": true }]),
        )
        .await;
    response.assert_ok();
    let updated: Vec<Value> = response.json();
    assert!(updated[0]["employee_id"].is_null());
}

#[tokio::test]
async fn test_update_unknown_item_is_not_found() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;

    app.put(
        "/api/v1/property/items",
        tenant.admin.token(),
        json!([{ "id": uuid::Uuid::new_v4(), "name": "Ghost" }]),
    )
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_delete_items() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let items = app
        .create_items(&tenant.admin, ItemFactory::batch(2))
        .await;
    let ids: Vec<&str> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();

    let response = app
        .delete_json("/api/v1/property/items", tenant.admin.token(), json!(ids))
        .await;
    response.assert_ok();
    assert_eq!(response.value()["deleted"], 2);

    app.get(
        &format!("/api/v1/property/items/{}", ids[0]),
        tenant.admin.token(),
    )
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_list_filters() {
    let app = TestApp::new().await;
    let tenant = app.tenant().await;
    let mut laptop = ItemFactory::with_inventory_number("LAP-100");
    laptop["name"] = json!("Laptop 14in");
    app.create_items(
        &tenant.admin,
        vec![
            laptop,
            ItemFactory::assigned_to(&tenant.employee.id),
            ItemFactory::create(),
        ],
    )
    .await;

    let by_search = app
        .get("/api/v1/property/items?search=lap", tenant.admin.token())
        .await
        .value();
    assert_eq!(by_search["total"], 1);
    assert_eq!(by_search["data"][0]["inventory_number"], "LAP-100");

    let mine = app
        .get("/api/v1/property/items?mine=true", tenant.employee.token())
        .await
        .value();
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["data"][0]["employee_id"], tenant.employee.id);

    let by_employee = app
        .get(
            &format!("/api/v1/property/items?employee_id={}", tenant.employee.id),
            tenant.admin.token(),
        )
        .await
        .value();
    assert_eq!(by_employee["total"], 1);

    app.get("/api/v1/property/items?mine=true", tenant.admin.token())
        .await
        .assert_bad_request();

    let paged = app
        .get(
            "/api/v1/property/items?page=2&page_size=2",
            tenant.admin.token(),
        )
        .await
        .value();
    assert_eq!(paged["total"], 3);
    assert_eq!(paged["page"], 2);
    assert_eq!(paged["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_items_are_isolated_between_tenants() {
    let app = TestApp::new().await;
    let first = app.tenant().await;
    let second = app.tenant().await;
    let items = app
        .create_items(&first.admin, vec![ItemFactory::create()])
        .await;

    app.get(
        &format!("/api/v1/property/items/{}", items[0]["id"].as_str().unwrap()),
        second.admin.token(),
    )
    .await
    .assert_not_found();
}
