//! Suggestion workflow step definitions

use cucumber::{then, when};
use serde_json::json;

use crate::common::ItemFactory;
use crate::features::support::TestWorld;

#[when(expr = "the employee suggests creating an item with inventory number {string}")]
async fn employee_suggests_create(world: &mut TestWorld, inventory_number: String) {
    let body = json!({
        "request_type": "create",
        "request_body": [ItemFactory::with_inventory_number(&inventory_number)],
    });
    let response = world
        .app()
        .post("/api/v1/property/suggestions", world.employee().token(), body)
        .await;
    world.suggestion = world.record(response);
}

#[when(expr = "the employee suggests deleting the item with inventory number {string}")]
async fn employee_suggests_delete(world: &mut TestWorld, inventory_number: String) {
    let item = world
        .find_item(&inventory_number)
        .await
        .expect("Item to delete does not exist");
    let body = json!({ "request_type": "delete", "request_body": [item["id"]] });
    let response = world
        .app()
        .post("/api/v1/property/suggestions", world.employee().token(), body)
        .await;
    world.suggestion = world.record(response);
}

#[when(expr = "the admin suggests creating an item with inventory number {string}")]
async fn admin_suggests_create(world: &mut TestWorld, inventory_number: String) {
    let body = json!({
        "request_type": "create",
        "request_body": [ItemFactory::with_inventory_number(&inventory_number)],
    });
    let response = world
        .app()
        .post("/api/v1/property/suggestions", world.admin().token(), body)
        .await;
    world.record(response);
}

#[when("the admin accepts the suggestion")]
async fn admin_accepts(world: &mut TestWorld) {
    let uri = format!(
        "/api/v1/property/suggestions/{}/accept",
        world.suggestion_id()
    );
    let response = world.app().post_empty(&uri, world.admin().token()).await;
    if let Some(decided) = world.record(response) {
        world.suggestion = Some(decided);
    }
}

#[when(expr = "the admin declines the suggestion with feedback {string}")]
async fn admin_declines_with_feedback(world: &mut TestWorld, feedback: String) {
    let uri = format!(
        "/api/v1/property/suggestions/{}/decline",
        world.suggestion_id()
    );
    let response = world
        .app()
        .post(&uri, world.admin().token(), json!({ "feedback": feedback }))
        .await;
    if let Some(decided) = world.record(response) {
        world.suggestion = Some(decided);
    }
}

#[when("the admin declines the suggestion")]
async fn admin_declines(world: &mut TestWorld) {
    let uri = format!(
        "/api/v1/property/suggestions/{}/decline",
        world.suggestion_id()
    );
    let response = world.app().post_empty(&uri, world.admin().token()).await;
    if let Some(decided) = world.record(response) {
        world.suggestion = Some(decided);
    }
}

#[when("the employee withdraws the suggestion")]
async fn employee_withdraws(world: &mut TestWorld) {
    let uri = format!("/api/v1/property/suggestions/{}", world.suggestion_id());
    let response = world.app().delete(&uri, world.employee().token()).await;
    world.record(response);
}

#[then(expr = "the suggestion should be {string}")]
async fn suggestion_status(world: &mut TestWorld, status: String) {
    let suggestion = world.suggestion.as_ref().expect("No suggestion");
    assert_eq!(suggestion["status"], status);
}

#[then(expr = "the stored suggestion should be {string}")]
async fn stored_suggestion_status(world: &mut TestWorld, status: String) {
    let uri = format!("/api/v1/property/suggestions/{}", world.suggestion_id());
    let stored = world.app().get(&uri, world.admin().token()).await.value();
    assert_eq!(stored["status"], status);
}

#[then(expr = "the suggestion feedback should be {string}")]
async fn suggestion_feedback(world: &mut TestWorld, feedback: String) {
    let suggestion = world.suggestion.as_ref().expect("No suggestion");
    assert_eq!(suggestion["feedback"], feedback);
}

#[then("the suggestion should no longer exist")]
async fn suggestion_gone(world: &mut TestWorld) {
    let uri = format!("/api/v1/property/suggestions/{}", world.suggestion_id());
    world
        .app()
        .get(&uri, world.admin().token())
        .await
        .assert_not_found();
}
