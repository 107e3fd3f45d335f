//! Scan campaign step definitions

use cucumber::{then, when};
use serde_json::json;

use crate::features::support::TestWorld;

#[when(expr = "the admin starts a scan named {string}")]
async fn admin_starts_scan(world: &mut TestWorld, name: String) {
    let response = world
        .app()
        .post(
            "/api/v1/property/scans",
            world.admin().token(),
            json!({ "name": name }),
        )
        .await;
    if let Some(scan) = world.record(response) {
        world.scan = Some(scan);
    }
}

#[when(expr = "the employee scans the item with inventory number {string}")]
async fn employee_scans_item(world: &mut TestWorld, inventory_number: String) {
    let item = world
        .find_item(&inventory_number)
        .await
        .expect("Item to scan does not exist");
    let uri = format!(
        "/api/v1/property/scans/items/{}",
        item["id"].as_str().unwrap_or_default()
    );
    let response = world.app().post_empty(&uri, world.employee().token()).await;
    world.record(response);
}

#[when("the admin completes the scan")]
async fn admin_completes_scan(world: &mut TestWorld) {
    let uri = format!("/api/v1/property/scans/{}/complete", world.scan_id());
    let response = world.app().post_empty(&uri, world.admin().token()).await;
    if let Some(scan) = world.record(response) {
        world.scan = Some(scan);
    }
}

#[then(expr = "the scan should report {int} of {int} items scanned")]
async fn scan_progress(world: &mut TestWorld, scanned: i64, total: i64) {
    let uri = format!("/api/v1/property/scans/{}", world.scan_id());
    let progress = world.app().get(&uri, world.admin().token()).await.value();
    assert_eq!(progress["scanned"], scanned);
    assert_eq!(progress["total"], total);
    assert_eq!(progress["remaining"], total - scanned);
}

#[then(expr = "the scan should be {string}")]
async fn scan_status(world: &mut TestWorld, status: String) {
    let scan = world.scan.as_ref().expect("No scan");
    assert_eq!(scan["status"], status);
}
