//! Caller profile endpoints.

use crate::api::auth::{ApiError, Authenticated};
use crate::dto::ProfileResponse;
use axum::Json;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Tag for OpenAPI documentation.
pub const PROFILE_TAG: &str = "Profile";

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(profile))
        .routes(routes!(token_info))
}

/// Identity of the caller.
#[tracing::instrument(skip(auth), fields(username = ?auth.identity.username))]
#[utoipa::path(
    get,
    path = "/profile",
    tag = PROFILE_TAG,
    operation_id = "Get Profile",
    summary = "Identity of the authenticated caller",
    description = "Returns subject, username, email and the merged realm, top-level and client roles of the bearer token.",
    security(("Authorization" = [])),
    responses(
        (status = 200, description = "Caller identity", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = ApiError),
    )
)]
pub async fn profile(Authenticated(auth): Authenticated) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(auth.identity))
}

/// Identity of the caller plus the raw claims.
#[tracing::instrument(skip(auth), fields(username = ?auth.identity.username))]
#[utoipa::path(
    get,
    path = "/profile/token-info",
    tag = PROFILE_TAG,
    operation_id = "Get Token Info",
    summary = "Identity and every claim of the bearer token",
    security(("Authorization" = [])),
    responses(
        (status = 200, description = "Caller identity with all claims", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = ApiError),
    )
)]
pub async fn token_info(Authenticated(auth): Authenticated) -> Json<ProfileResponse> {
    let mut response = ProfileResponse::from(auth.identity);
    response.all_claims = Some(auth.claims);
    Json(response)
}
