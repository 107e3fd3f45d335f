//! Flow fixtures
//!
//! Walk the public API to put accounts and tenants into a known state.

use serde_json::{json, Value};

use property_inventory::services::MailKind;

use super::{AccountFactory, TestApp, TEST_PASSWORD};

/// A logged-in account
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        Some(self.token.as_str())
    }
}

/// An admin with an organization and property, plus one member employee
#[derive(Debug, Clone)]
pub struct Tenant {
    pub admin: Session,
    pub employee: Session,
    pub organization_id: String,
    pub property_id: String,
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    fn register_path(&self) -> &'static str {
        match self {
            Role::Admin => "/api/v1/auth/admins/register",
            Role::Employee => "/api/v1/auth/employees/register",
        }
    }
}

impl TestApp {
    /// Register an account without verifying it
    pub async fn register(&self, role: Role, email: &str) -> Value {
        let response = self
            .post(role.register_path(), None, AccountFactory::registration(email))
            .await;
        response.assert_created();
        response.value()
    }

    /// Verify using the token from the outbox
    pub async fn verify(&self, email: &str) {
        let token = self
            .mailer
            .last_token(email, MailKind::EmailVerification)
            .expect("No verification mail was sent");
        self.post("/api/v1/auth/verify-email", None, json!({ "token": token }))
            .await
            .assert_ok();
    }

    pub async fn login(&self, email: &str, password: &str) -> Session {
        let response = self
            .post(
                "/api/v1/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        response.assert_ok();
        let body = response.value();
        Session {
            id: body["account"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Register, verify and log in
    pub async fn session(&self, role: Role) -> Session {
        let email = AccountFactory::email();
        self.register(role, &email).await;
        self.verify(&email).await;
        self.login(&email, TEST_PASSWORD).await
    }

    pub async fn admin(&self) -> Session {
        self.session(Role::Admin).await
    }

    pub async fn employee(&self) -> Session {
        self.session(Role::Employee).await
    }

    /// Create the admin's organization, returning its id
    pub async fn organization(&self, admin: &Session) -> String {
        let response = self
            .post(
                "/api/v1/organization",
                admin.token(),
                json!({ "name": "Acme Logistics", "description": "Warehouse operator" }),
            )
            .await;
        response.assert_created();
        response.value()["id"].as_str().unwrap().to_string()
    }

    /// Create the organization's property, returning its id
    pub async fn property(&self, admin: &Session) -> String {
        let response = self
            .post(
                "/api/v1/property",
                admin.token(),
                json!({ "name": "Main warehouse" }),
            )
            .await;
        response.assert_created();
        response.value()["id"].as_str().unwrap().to_string()
    }

    /// Invite an employee and return the invitation id
    pub async fn invite(&self, admin: &Session, employee: &Session) -> String {
        let response = self
            .post(
                "/api/v1/organization/invitations",
                admin.token(),
                json!({ "email": employee.email }),
            )
            .await;
        response.assert_created();
        response.value()["id"].as_str().unwrap().to_string()
    }

    /// Invite and accept
    pub async fn join(&self, admin: &Session, employee: &Session) {
        let invitation_id = self.invite(admin, employee).await;
        self.post_empty(
            &format!("/api/v1/invitations/{}/accept", invitation_id),
            employee.token(),
        )
        .await
        .assert_ok();
    }

    /// Admin, organization, property and one member employee
    pub async fn tenant(&self) -> Tenant {
        let admin = self.admin().await;
        let organization_id = self.organization(&admin).await;
        let property_id = self.property(&admin).await;
        let employee = self.employee().await;
        self.join(&admin, &employee).await;

        Tenant {
            admin,
            employee,
            organization_id,
            property_id,
        }
    }

    /// Create items as the admin and return them
    pub async fn create_items(&self, admin: &Session, items: Vec<Value>) -> Vec<Value> {
        let response = self
            .post("/api/v1/property/items", admin.token(), Value::Array(items))
            .await;
        response.assert_created();
        response.json()
    }

    /// Submit a suggestion as an employee and return it
    pub async fn suggest(&self, employee: &Session, request_type: &str, body: Value) -> Value {
        let response = self
            .post(
                "/api/v1/property/suggestions",
                employee.token(),
                json!({ "request_type": request_type, "request_body": body }),
            )
            .await;
        response.assert_created();
        response.value()
    }
}
