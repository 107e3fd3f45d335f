//! Registration, verification, login and password flows

use rstest::rstest;
use serde_json::json;

use property_inventory::services::MailKind;

use crate::common::{AccountFactory, Role, TestApp, TEST_PASSWORD};

#[rstest]
#[case::admin(Role::Admin, "admin")]
#[case::employee(Role::Employee, "employee")]
#[tokio::test]
async fn test_registration_creates_unverified_account(#[case] role: Role, #[case] expected: &str) {
    let app = TestApp::new().await;
    let email = AccountFactory::email();

    let profile = app.register(role, &email).await;

    assert_eq!(profile["role"], expected);
    assert_eq!(profile["email"], email);
    assert_eq!(profile["is_verified"], false);
    assert!(profile.get("password_hash").is_none());
    assert!(app
        .mailer
        .last_token(&email, MailKind::EmailVerification)
        .is_some());
}

#[tokio::test]
async fn test_email_is_unique_across_roles() {
    let app = TestApp::new().await;
    let email = AccountFactory::email();
    app.register(Role::Admin, &email).await;

    app.post(
        "/api/v1/auth/employees/register",
        None,
        AccountFactory::registration(&email),
    )
    .await
    .assert_conflict();
}

#[tokio::test]
async fn test_short_password_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .post(
            "/api/v1/auth/admins/register",
            None,
            json!({
                "email": AccountFactory::email(),
                "full_name": "Short Password",
                "password": "abc",
            }),
        )
        .await;

    response.assert_bad_request();
    assert!(response.value()["errors"]["password"].is_array());
}

#[tokio::test]
async fn test_unverified_login_is_refused() {
    let app = TestApp::new().await;
    let email = AccountFactory::email();
    app.register(Role::Employee, &email).await;

    let response = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": email, "password": TEST_PASSWORD }),
        )
        .await;

    response.assert_bad_request();
    assert!(response.value()["detail"]
        .as_str()
        .unwrap()
        .contains("not verified"));
}

#[tokio::test]
async fn test_verified_login_issues_tokens() {
    let app = TestApp::new().await;
    let email = AccountFactory::email();
    app.register(Role::Admin, &email).await;
    app.verify(&email).await;

    let response = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": email.to_uppercase(), "password": TEST_PASSWORD }),
        )
        .await;

    response.assert_ok();
    let body = response.value();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["account"]["is_verified"], true);
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
}

#[tokio::test]
async fn test_verify_twice_is_rejected() {
    let app = TestApp::new().await;
    let email = AccountFactory::email();
    app.register(Role::Admin, &email).await;
    app.verify(&email).await;

    let token = app
        .mailer
        .last_token(&email, MailKind::EmailVerification)
        .unwrap();
    app.post("/api/v1/auth/verify-email", None, json!({ "token": token }))
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let wrong_password = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": admin.email, "password": "definitely-wrong" }),
        )
        .await;
    let unknown = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
        )
        .await;

    wrong_password.assert_unauthorized();
    unknown.assert_unauthorized();
    assert_eq!(wrong_password.value()["detail"], unknown.value()["detail"]);
}

#[tokio::test]
async fn test_refresh_token_issues_access_token() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let response = app
        .post(
            "/api/v1/auth/refresh",
            None,
            json!({ "refresh_token": admin.refresh_token }),
        )
        .await;

    response.assert_ok();
    let access = response.value()["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    app.get("/api/v1/me", Some(&access)).await.assert_ok();
}

#[tokio::test]
async fn test_tokens_are_bound_to_their_purpose() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    // An access token cannot refresh, a refresh token cannot authenticate
    app.post(
        "/api/v1/auth/refresh",
        None,
        json!({ "refresh_token": admin.token }),
    )
    .await
    .assert_unauthorized();
    app.get("/api/v1/me", Some(&admin.refresh_token))
        .await
        .assert_unauthorized();

    let verification = app
        .mailer
        .last_token(&admin.email, MailKind::EmailVerification)
        .unwrap();
    app.get("/api/v1/me", Some(&verification))
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_recovery_token_cannot_verify_email() {
    let app = TestApp::new().await;
    let email = AccountFactory::email();
    app.register(Role::Employee, &email).await;
    app.post(
        "/api/v1/auth/recover-password",
        None,
        json!({ "email": email }),
    )
    .await
    .assert_ok();
    let recovery = app
        .mailer
        .last_token(&email, MailKind::PasswordRecovery)
        .expect("recovery mail");

    app.post(
        "/api/v1/auth/verify-email",
        None,
        json!({ "token": recovery }),
    )
    .await
    .assert_unauthorized();

    // Still unverified
    app.post(
        "/api/v1/auth/login",
        None,
        json!({ "email": email, "password": TEST_PASSWORD }),
    )
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_resend_verification_does_not_leak_accounts() {
    let app = TestApp::new().await;
    let email = AccountFactory::email();
    app.register(Role::Employee, &email).await;

    let known = app
        .post(
            "/api/v1/auth/resend-verification",
            None,
            json!({ "email": email }),
        )
        .await;
    let unknown = app
        .post(
            "/api/v1/auth/resend-verification",
            None,
            json!({ "email": "ghost@example.com" }),
        )
        .await;

    known.assert_ok();
    unknown.assert_ok();
    assert_eq!(known.value()["message"], unknown.value()["message"]);
    let sent = app
        .mailer
        .messages()
        .into_iter()
        .filter(|m| m.to == email && m.kind == MailKind::EmailVerification)
        .count();
    assert_eq!(sent, 2);
}

#[tokio::test]
async fn test_password_recovery_flow() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    app.post(
        "/api/v1/auth/recover-password",
        None,
        json!({ "email": admin.email }),
    )
    .await
    .assert_ok();
    let token = app
        .mailer
        .last_token(&admin.email, MailKind::PasswordRecovery)
        .expect("recovery mail");

    app.post(
        "/api/v1/auth/reset-password",
        None,
        json!({ "token": token, "new_password": "Brand-New-Secret-42" }),
    )
    .await
    .assert_ok();

    app.post(
        "/api/v1/auth/login",
        None,
        json!({ "email": admin.email, "password": TEST_PASSWORD }),
    )
    .await
    .assert_unauthorized();
    app.login(&admin.email, "Brand-New-Secret-42").await;
}

#[tokio::test]
async fn test_change_password_requires_current_password() {
    let app = TestApp::new().await;
    let employee = app.employee().await;

    app.post(
        "/api/v1/me/password",
        employee.token(),
        json!({ "current_password": "wrong-password", "new_password": "Another-Secret-1" }),
    )
    .await
    .assert_unauthorized();

    app.post(
        "/api/v1/me/password",
        employee.token(),
        json!({ "current_password": TEST_PASSWORD, "new_password": "Another-Secret-1" }),
    )
    .await
    .assert_ok();
    app.login(&employee.email, "Another-Secret-1").await;
}

#[tokio::test]
async fn test_profile_read_and_update() {
    let app = TestApp::new().await;
    let employee = app.employee().await;

    let response = app.get("/api/v1/me", employee.token()).await;
    response.assert_ok();
    assert_eq!(response.value()["id"], employee.id);

    let response = app
        .put(
            "/api/v1/me",
            employee.token(),
            json!({ "full_name": "Renamed Person" }),
        )
        .await;
    response.assert_ok();
    assert_eq!(response.value()["full_name"], "Renamed Person");
}
