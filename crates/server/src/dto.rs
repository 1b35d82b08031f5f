//! Request and response payloads of the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::auth::Identity;
use crate::entity::user;

/// Message returned alongside a freshly generated temporary password.
pub const TEMPORARY_PASSWORD_MESSAGE: &str =
    "User created successfully. This password is temporary and must be changed on first login.";

/// Body of `POST /users` and `PUT /users/{id}`.
///
/// Missing `username`/`email` deserialize to empty strings so they are
/// reported by validation rather than by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    /// Unique login name, 3 to 50 characters.
    #[serde(default)]
    #[schema(example = "johndoe")]
    pub username: String,
    /// Unique, well-formed email address.
    #[serde(default)]
    #[schema(example = "john.doe@example.com")]
    pub email: String,
    /// At most 100 characters.
    #[serde(default)]
    #[schema(example = "John Doe")]
    pub full_name: Option<String>,
    /// Defaults to `true` on creation; left unchanged on update when omitted.
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub active: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            active: model.active,
        }
    }
}

/// Result of a successful creation. The password is only ever returned here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateResponse {
    pub user: UserResponse,
    pub temporary_password: String,
    pub message: String,
}

/// Caller profile derived from the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Provider-assigned subject id.
    pub subject: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    /// Epoch seconds.
    pub issued_at: Option<i64>,
    /// Epoch seconds.
    pub expires_at: Option<i64>,
    /// Every claim of the token; only present on `/profile/token-info`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub all_claims: Option<Map<String, Value>>,
}

impl From<Identity> for ProfileResponse {
    fn from(identity: Identity) -> Self {
        Self {
            subject: identity.subject,
            username: identity.username,
            email: identity.email,
            roles: identity.roles,
            issued_at: identity.issued_at,
            expires_at: identity.expires_at,
            all_claims: None,
        }
    }
}
