//! Registration, login, profile and password management.

use serde_json::json;
use uuid::Uuid;
use workflow_tests::{data, error_of, TestApp};

#[tokio::test]
async fn register_login_and_profile_roundtrip() {
    let app = TestApp::spawn().await;
    let (token, id) = app.register_customer("ravi@example.com").await;

    let profile = data(app.get("/users/me", Some(&token)).await).await;
    assert_eq!(profile["email"], json!("ravi@example.com"));
    assert_eq!(profile["role"], json!("customer"));
    assert_eq!(profile["id"], json!(id.to_string()));
    assert!(profile.get("password_hash").is_none());

    let login = data(
        app.post(
            "/auth/login",
            None,
            json!({ "email": "ravi@example.com", "password": "customer-pass-1" }),
        )
        .await,
    )
    .await;
    assert!(login["token"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_customer("dup@example.com").await;

    let response = app
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Second",
                "email": "dup@example.com",
                "password": "another-pass-1",
                "phone": "+910000000000",
            }),
        )
        .await;
    let error = error_of(response, 400).await;
    assert!(error.contains("already registered"), "{}", error);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_identical() {
    let app = TestApp::spawn().await;
    app.register_customer("priya@example.com").await;

    let wrong_password = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "priya@example.com", "password": "wrong-password" }),
        )
        .await;
    let unknown_email = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "ghost@example.com", "password": "whatever-pass" }),
        )
        .await;

    let first = error_of(wrong_password, 401).await;
    let second = error_of(unknown_email, 401).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn validation_failures_use_the_error_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Short",
                "email": "not-an-email",
                "password": "short",
                "phone": "+911234567890",
            }),
        )
        .await;
    error_of(response, 400).await;
}

#[tokio::test]
async fn admin_role_cannot_self_register() {
    let app = TestApp::spawn().await;
    let response = app
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Sneaky",
                "email": "sneaky@example.com",
                "password": "password-123",
                "phone": "+911234567890",
                "role": "admin",
            }),
        )
        .await;
    error_of(response, 403).await;
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::spawn().await;

    let no_token = app.get("/users/me", None).await;
    error_of(no_token, 401).await;

    let bad_token = app.get("/users/me", Some("not-a-jwt")).await;
    error_of(bad_token, 401).await;
}

#[tokio::test]
async fn admin_routes_reject_customers() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("plain@example.com").await;

    let response = app.get("/admin/bookings", Some(&token)).await;
    error_of(response, 403).await;
}

#[tokio::test]
async fn profile_update_changes_fields_and_guards_email_conflicts() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("update-me@example.com").await;
    app.register_customer("taken@example.com").await;

    let updated = data(
        app.put(
            "/users/me",
            Some(&token),
            json!({ "name": "Renamed", "phone": "+917654321098" }),
        )
        .await,
    )
    .await;
    assert_eq!(updated["name"], json!("Renamed"));
    assert_eq!(updated["phone"], json!("+917654321098"));

    let conflict = app
        .put("/users/me", Some(&token), json!({ "email": "taken@example.com" }))
        .await;
    error_of(conflict, 400).await;
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("rotate@example.com").await;

    let wrong = app
        .post(
            "/users/change-password",
            Some(&token),
            json!({ "current_password": "nope-nope-nope", "new_password": "fresh-password-1" }),
        )
        .await;
    error_of(wrong, 401).await;

    data(
        app.post(
            "/users/change-password",
            Some(&token),
            json!({ "current_password": "customer-pass-1", "new_password": "fresh-password-1" }),
        )
        .await,
    )
    .await;

    let relog = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "rotate@example.com", "password": "fresh-password-1" }),
        )
        .await;
    data(relog).await;
}

#[tokio::test]
async fn password_reset_flow_with_emitted_code() {
    let app = TestApp::spawn().await;
    app.register_customer("forgot@example.com").await;

    data(
        app.post(
            "/auth/forgot-password",
            None,
            json!({ "email": "forgot@example.com" }),
        )
        .await,
    )
    .await;

    // The code travels by email; tests read it off the stored account.
    let account = app
        .stores
        .accounts
        .find_by_email("forgot@example.com")
        .await
        .unwrap()
        .unwrap();
    let code = account.reset_code.expect("no reset code stored").code;

    // Pre-flight check clients run before showing the new-password form.
    data(
        app.post(
            "/auth/verify-reset-code",
            None,
            json!({ "email": "forgot@example.com", "code": code }),
        )
        .await,
    )
    .await;
    if code != "111111" {
        let bad = app
            .post(
                "/auth/verify-reset-code",
                None,
                json!({ "email": "forgot@example.com", "code": "111111" }),
            )
            .await;
        error_of(bad, 400).await;
    }

    let wrong_code = app
        .post(
            "/auth/reset-password",
            None,
            json!({
                "email": "forgot@example.com",
                "code": "000000",
                "new_password": "reset-password-1",
            }),
        )
        .await;
    // A six digit code that simply does not match.
    if code != "000000" {
        error_of(wrong_code, 400).await;
    }

    let reset = data(
        app.post(
            "/auth/reset-password",
            None,
            json!({
                "email": "forgot@example.com",
                "code": code,
                "new_password": "reset-password-1",
            }),
        )
        .await,
    )
    .await;
    assert!(reset["token"].as_str().is_some());

    data(
        app.post(
            "/auth/login",
            None,
            json!({ "email": "forgot@example.com", "password": "reset-password-1" }),
        )
        .await,
    )
    .await;
}

#[tokio::test]
async fn forgot_password_does_not_reveal_account_existence() {
    let app = TestApp::spawn().await;
    app.register_customer("known@example.com").await;

    let known = data(
        app.post("/auth/forgot-password", None, json!({ "email": "known@example.com" }))
            .await,
    )
    .await;
    let unknown = data(
        app.post(
            "/auth/forgot-password",
            None,
            json!({ "email": format!("nobody-{}@example.com", Uuid::new_v4()) }),
        )
        .await,
    )
    .await;
    assert_eq!(known, unknown);
}
