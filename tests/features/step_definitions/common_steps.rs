//! Common step definitions used across features

use cucumber::{given, then};
use crate::common::ItemFactory;
use crate::features::support::TestWorld;

#[given("an organization with a property and a member employee")]
async fn organization_with_member(world: &mut TestWorld) {
    world.start_tenant().await;
}

#[given(expr = "the property has an item with inventory number {string}")]
async fn property_has_item(world: &mut TestWorld, inventory_number: String) {
    let item = ItemFactory::with_inventory_number(&inventory_number);
    world.app().create_items(world.admin(), vec![item]).await;
}

#[given(expr = "the property has {int} items")]
async fn property_has_items(world: &mut TestWorld, count: usize) {
    world
        .app()
        .create_items(world.admin(), ItemFactory::batch(count))
        .await;
}

#[then(expr = "the response status should be {int}")]
async fn response_status(world: &mut TestWorld, status: u16) {
    assert_eq!(
        world.response().status.as_u16(),
        status,
        "unexpected status, body: {}",
        world.response().text()
    );
}

#[then("the response should be a problem document")]
async fn response_is_problem(world: &mut TestWorld) {
    let body = world.response().value();
    assert!(body.get("type").is_some());
    assert!(body.get("detail").is_some());
}

#[then(expr = "the property should contain an item with inventory number {string}")]
async fn property_contains_item(world: &mut TestWorld, inventory_number: String) {
    assert!(world.find_item(&inventory_number).await.is_some());
}

#[then(expr = "the property should not contain an item with inventory number {string}")]
async fn property_lacks_item(world: &mut TestWorld, inventory_number: String) {
    assert!(world.find_item(&inventory_number).await.is_none());
}
