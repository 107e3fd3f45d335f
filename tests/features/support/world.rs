//! Test world for Cucumber scenarios

use std::fmt;

use cucumber::World;
use serde_json::Value;

use crate::common::{Session, Tenant, TestApp, TestResponse};

/// Scenario state. Every scenario gets its own application and database.
#[derive(Default, World)]
pub struct TestWorld {
    pub app: Option<TestApp>,
    pub tenant: Option<Tenant>,

    /// Last suggestion or scan created in the scenario
    pub suggestion: Option<Value>,
    pub scan: Option<Value>,

    /// Response from last API call
    pub last_response: Option<TestResponse>,
}

impl fmt::Debug for TestWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestWorld")
            .field("tenant", &self.tenant)
            .field("suggestion", &self.suggestion)
            .field("scan", &self.scan)
            .field("last_response", &self.last_response.as_ref().map(|r| r.status))
            .finish()
    }
}

impl TestWorld {
    pub fn app(&self) -> &TestApp {
        self.app.as_ref().expect("No application; add a Given step")
    }

    pub fn tenant(&self) -> &Tenant {
        self.tenant.as_ref().expect("No tenant; add a Given step")
    }

    pub fn admin(&self) -> &Session {
        &self.tenant().admin
    }

    pub fn employee(&self) -> &Session {
        &self.tenant().employee
    }

    pub fn response(&self) -> &TestResponse {
        self.last_response.as_ref().expect("No response available")
    }

    /// Start a fresh application with one admin, organization, property and member
    pub async fn start_tenant(&mut self) {
        let app = TestApp::new().await;
        self.tenant = Some(app.tenant().await);
        self.app = Some(app);
    }

    /// Keep the response and, when it is a success, the returned document
    pub fn record(&mut self, response: TestResponse) -> Option<Value> {
        let body = (response.is_success() && !response.body.is_empty()).then(|| response.value());
        self.last_response = Some(response);
        body
    }

    pub fn suggestion_id(&self) -> String {
        self.suggestion
            .as_ref()
            .and_then(|s| s["id"].as_str())
            .expect("No suggestion in this scenario")
            .to_string()
    }

    pub fn scan_id(&self) -> String {
        self.scan
            .as_ref()
            .and_then(|s| s["id"].as_str())
            .expect("No scan in this scenario")
            .to_string()
    }

    /// Look an item up by inventory number through the list filter
    pub async fn find_item(&self, inventory_number: &str) -> Option<Value> {
        let page = self
            .app()
            .get(
                &format!("/api/v1/property/items?search={}", inventory_number),
                self.admin().token(),
            )
            .await
            .value();
        page["data"]
            .as_array()?
            .iter()
            .find(|item| item["inventory_number"] == inventory_number)
            .cloned()
    }
}
