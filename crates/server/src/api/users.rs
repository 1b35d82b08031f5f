//! User management endpoints.
//!
//! - `GET /users` - list users (`ADMIN`)
//! - `POST /users` - provision a user (`ADMIN`)
//! - `GET /users/{id}` - fetch one user
//! - `PUT /users/{id}` - update the local record
//! - `DELETE /users/{id}` - remove a user (`ADMIN`)

use crate::AppResources;
use crate::api::auth::{ADMIN_ROLE, ApiError, Authenticated};
use crate::dto::{UserCreateResponse, UserRequest, UserResponse};
use axum::{
    Extension, Json,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const USERS_TAG: &str = "Users";

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_user, update_user, delete_user))
}

/// List all users.
#[tracing::instrument(skip(resources, auth))]
#[utoipa::path(
    get,
    path = "/users",
    tag = USERS_TAG,
    operation_id = "List Users",
    summary = "List all local users",
    description = "**Authorization:** requires the `ADMIN` role.",
    security(("Authorization" = [])),
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 403, description = "Caller lacks the ADMIN role", body = ApiError),
    )
)]
pub async fn list_users(
    Extension(resources): Extension<AppResources>,
    Authenticated(auth): Authenticated,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    auth.require_role(ADMIN_ROLE)?;
    Ok(Json(resources.provisioning.list_users().await?))
}

/// Provision a new user.
#[tracing::instrument(skip(resources, auth, payload))]
#[utoipa::path(
    post,
    path = "/users",
    tag = USERS_TAG,
    operation_id = "Create User",
    summary = "Create a user locally and in the identity provider",
    description = "Creates the user in the identity provider with a generated temporary password, \
                   grants the default realm role and stores the local record.\n\n\
                   **Authorization:** requires the `ADMIN` role.\n\n\
                   The temporary password is only returned in this response and must be changed on first login.",
    security(("Authorization" = [])),
    request_body(content = UserRequest, description = "User details"),
    responses(
        (status = 201, description = "User created", body = UserCreateResponse),
        (status = 400, description = "Invalid user data", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 403, description = "Caller lacks the ADMIN role", body = ApiError),
        (status = 409, description = "Username or email already exists", body = ApiError),
        (status = 500, description = "Identity provider rejected the user", body = ApiError),
    )
)]
pub async fn create_user(
    Extension(resources): Extension<AppResources>,
    Authenticated(auth): Authenticated,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreateResponse>), ApiError> {
    auth.require_role(ADMIN_ROLE)?;
    let Json(payload) = payload?;
    let created = resources.provisioning.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch a user by id.
#[tracing::instrument(skip(resources, _auth))]
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = USERS_TAG,
    operation_id = "Get User",
    summary = "Fetch one user",
    security(("Authorization" = [])),
    params(("id" = i64, Path, description = "Local user id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "No user with this id", body = ApiError),
    )
)]
pub async fn get_user(
    Extension(resources): Extension<AppResources>,
    Authenticated(_auth): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(resources.provisioning.get_user(id).await?))
}

/// Update the local user record.
#[tracing::instrument(skip(resources, _auth, payload))]
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = USERS_TAG,
    operation_id = "Update User",
    summary = "Update a user",
    description = "Only the local record changes; the identity provider is not updated. \
                   `active` is left unchanged when omitted.",
    security(("Authorization" = [])),
    params(("id" = i64, Path, description = "Local user id")),
    request_body(content = UserRequest, description = "New user details"),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid user data", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "No user with this id", body = ApiError),
        (status = 409, description = "Username or email already used by another user", body = ApiError),
    )
)]
pub async fn update_user(
    Extension(resources): Extension<AppResources>,
    Authenticated(_auth): Authenticated,
    Path(id): Path<i64>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(resources.provisioning.update_user(id, payload).await?))
}

/// Delete a user.
#[tracing::instrument(skip(resources, auth))]
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = USERS_TAG,
    operation_id = "Delete User",
    summary = "Delete a user",
    description = "Deletes the local record, then removes the user from the identity provider. \
                   A failing remote delete does not fail the request.\n\n\
                   **Authorization:** requires the `ADMIN` role.",
    security(("Authorization" = [])),
    params(("id" = i64, Path, description = "Local user id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 403, description = "Caller lacks the ADMIN role", body = ApiError),
        (status = 404, description = "No user with this id", body = ApiError),
    )
)]
pub async fn delete_user(
    Extension(resources): Extension<AppResources>,
    Authenticated(auth): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN_ROLE)?;
    resources.provisioning.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
