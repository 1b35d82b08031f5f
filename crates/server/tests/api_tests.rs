//! HTTP tests for the full application router.

mod common;

use auth_service::api::app;
use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use common::{CreateOutcome, FakeIdentityProvider, test_resources};
use serde_json::{Value, json};
use std::sync::Arc;

async fn server_with(idp: Arc<FakeIdentityProvider>) -> TestServer {
    let resources = test_resources(idp).await;
    TestServer::new(app(resources)).expect("create test server")
}

async fn server() -> TestServer {
    server_with(Arc::new(FakeIdentityProvider::default())).await
}

async fn create_john(server: &TestServer) -> Value {
    let response = server
        .post("/api/v1/users")
        .authorization_bearer("admin-token")
        .json(&json!({
            "username": "johndoe",
            "email": "john.doe@example.com",
            "fullName": "John Doe"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

// =============================================================================
// Health and docs
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let server = server().await;

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn test_api_docs_are_served() {
    let server = server().await;

    let response = server.get("/api-docs").await;

    response.assert_status_ok();
    assert!(response.text().contains("redoc"));
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_profile_requires_token() {
    let server = server().await;

    let response = server.get("/api/v1/profile").await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "invalid_token");
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_profile_rejects_non_bearer_scheme() {
    let server = server().await;

    let response = server
        .get("/api/v1/profile")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        )
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_profile_accepts_lowercase_bearer_scheme() {
    let server = server().await;

    let response = server
        .get("/api/v1/profile")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer admin-token"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["username"], "admin");
}

#[tokio::test]
async fn test_profile_rejects_invalid_token() {
    let server = server().await;

    let response = server
        .get("/api/v1/profile")
        .authorization_bearer("forged")
        .await;

    response.assert_status_unauthorized();
    assert_eq!(
        response.json::<Value>()["error_description"],
        "Invalid or expired token"
    );
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_profile_returns_identity() {
    let server = server().await;

    let response = server
        .get("/api/v1/profile")
        .authorization_bearer("user-token")
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["subject"], "user-subject");
    assert_eq!(body["username"], "jane");
    assert_eq!(body["email"], Value::Null);
    assert_eq!(body["roles"], json!(["USER", "view-profile"]));
    assert_eq!(body["issuedAt"], Value::Null);
    assert!(body.get("allClaims").is_none());
}

#[tokio::test]
async fn test_token_info_includes_all_claims() {
    let server = server().await;

    let response = server
        .get("/api/v1/profile/token-info")
        .authorization_bearer("admin-token")
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["issuedAt"], 1704063600);
    assert_eq!(body["expiresAt"], 1704067200);
    assert_eq!(body["allClaims"]["preferred_username"], "admin");
    assert_eq!(body["allClaims"]["realm_access"]["roles"], json!(["ADMIN", "USER"]));
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_list_users_requires_admin() {
    let server = server().await;

    let response = server
        .get("/api/v1/users")
        .authorization_bearer("user-token")
        .await;

    response.assert_status_forbidden();
    assert_eq!(response.json::<Value>()["error"], "forbidden");
}

#[tokio::test]
async fn test_create_and_list_users() {
    let server = server().await;

    let created = create_john(&server).await;
    assert_eq!(created["user"]["username"], "johndoe");
    assert_eq!(created["user"]["fullName"], "John Doe");
    assert_eq!(created["user"]["active"], true);
    assert_eq!(created["temporaryPassword"].as_str().unwrap().len(), 12);
    assert_eq!(
        created["message"],
        "User created successfully. This password is temporary and must be changed on first login."
    );

    let response = server
        .get("/api/v1/users")
        .authorization_bearer("admin-token")
        .await;
    response.assert_status_ok();
    let users = response.json::<Value>();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert!(users[0].get("temporaryPassword").is_none());
}

#[tokio::test]
async fn test_create_requires_admin() {
    let idp = Arc::new(FakeIdentityProvider::default());
    let server = server_with(idp.clone()).await;

    let response = server
        .post("/api/v1/users")
        .authorization_bearer("user-token")
        .json(&json!({ "username": "johndoe", "email": "john@example.com" }))
        .await;

    response.assert_status_forbidden();
    assert!(idp.calls().is_empty());
}

#[tokio::test]
async fn test_create_duplicate_is_conflict() {
    let server = server().await;
    create_john(&server).await;

    let response = server
        .post("/api/v1/users")
        .authorization_bearer("admin-token")
        .json(&json!({ "username": "johndoe", "email": "someone@example.com" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "conflict");
}

#[tokio::test]
async fn test_create_validation_errors() {
    let server = server().await;

    let response = server
        .post("/api/v1/users")
        .authorization_bearer("admin-token")
        .json(&json!({ "username": "  ", "email": "nope" }))
        .await;

    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert_eq!(body["error"], "validation_failed");
    let fields: Vec<_> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["username", "email"]);
}

#[tokio::test]
async fn test_create_malformed_body_is_validation_error() {
    let idp = Arc::new(FakeIdentityProvider::default());
    let server = server_with(idp.clone()).await;

    let response = server
        .post("/api/v1/users")
        .authorization_bearer("admin-token")
        .json(&json!({ "username": 12345, "email": "john@example.com" }))
        .await;

    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert_eq!(body["error"], "validation_failed");
    assert!(
        body["error_description"]
            .as_str()
            .unwrap()
            .starts_with("Malformed request body")
    );
    assert!(idp.calls().is_empty());
}

#[tokio::test]
async fn test_create_malformed_body_without_admin_is_forbidden() {
    let server = server().await;

    let response = server
        .post("/api/v1/users")
        .authorization_bearer("user-token")
        .json(&json!({ "username": 12345 }))
        .await;

    response.assert_status_forbidden();
}

#[tokio::test]
async fn test_create_without_json_body_is_bad_request() {
    let server = server().await;

    let response = server
        .post("/api/v1/users")
        .authorization_bearer("admin-token")
        .text("username=johndoe")
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "validation_failed");
}

#[tokio::test]
async fn test_create_remote_failure_is_server_error() {
    let server = server_with(Arc::new(FakeIdentityProvider::with_create_outcome(
        CreateOutcome::Fails(500),
    )))
    .await;

    let response = server
        .post("/api/v1/users")
        .authorization_bearer("admin-token")
        .json(&json!({ "username": "johndoe", "email": "john@example.com" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "provisioning_failed");
    assert!(
        body["error_description"]
            .as_str()
            .unwrap()
            .starts_with("Failed to create user in the identity provider")
    );

    let listed = server
        .get("/api/v1/users")
        .authorization_bearer("admin-token")
        .await
        .json::<Value>();
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_get_user_by_id() {
    let server = server().await;
    let created = create_john(&server).await;
    let id = created["user"]["id"].as_i64().unwrap();

    let response = server
        .get(&format!("/api/v1/users/{id}"))
        .authorization_bearer("user-token")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["email"], "john.doe@example.com");

    let response = server
        .get("/api/v1/users/9999")
        .authorization_bearer("user-token")
        .await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"], "not_found");
}

#[tokio::test]
async fn test_update_user() {
    let idp = Arc::new(FakeIdentityProvider::default());
    let server = server_with(idp.clone()).await;
    let created = create_john(&server).await;
    let id = created["user"]["id"].as_i64().unwrap();
    idp.calls.lock().unwrap().clear();

    let response = server
        .put(&format!("/api/v1/users/{id}"))
        .authorization_bearer("user-token")
        .json(&json!({
            "username": "johndoe",
            "email": "john@example.org",
            "active": false
        }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["email"], "john@example.org");
    assert_eq!(body["active"], false);
    assert_eq!(body["fullName"], Value::Null);
    assert!(idp.calls().is_empty());

    let response = server
        .put("/api/v1/users/9999")
        .authorization_bearer("user-token")
        .json(&json!({ "username": "johndoe", "email": "john@example.org" }))
        .await;
    response.assert_status_not_found();

    let response = server
        .put(&format!("/api/v1/users/{id}"))
        .authorization_bearer("user-token")
        .json(&json!({ "username": "jd", "email": "john@example.org" }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .put(&format!("/api/v1/users/{id}"))
        .authorization_bearer("user-token")
        .json(&json!({ "username": "johndoe", "email": "john@example.org", "active": "no" }))
        .await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "validation_failed");
}

#[tokio::test]
async fn test_delete_user() {
    let idp = Arc::new(FakeIdentityProvider {
        fail_delete: true,
        ..FakeIdentityProvider::default()
    });
    let server = server_with(idp.clone()).await;
    let created = create_john(&server).await;
    let id = created["user"]["id"].as_i64().unwrap();

    let response = server
        .delete(&format!("/api/v1/users/{id}"))
        .authorization_bearer("user-token")
        .await;
    response.assert_status_forbidden();

    let response = server
        .delete(&format!("/api/v1/users/{id}"))
        .authorization_bearer("admin-token")
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert!(idp.calls().contains(&"delete_user:johndoe".to_string()));

    let response = server
        .delete(&format!("/api/v1/users/{id}"))
        .authorization_bearer("admin-token")
        .await;
    response.assert_status_not_found();
}
