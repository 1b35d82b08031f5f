//! Bearer authentication and the JSON error body shared by all endpoints.

use crate::AppResources;
use crate::auth::{AuthoritySet, ClaimSet, Identity, extract, to_authorities};
use crate::error::ProvisioningError;
use crate::validation::FieldError;
use axum::{
    Json,
    extract::{FromRequestParts, rejection::JsonRejection},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role required for user administration.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code (e.g., "invalid_token", "conflict")
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Rejected fields, only for "validation_failed"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ApiError {
    fn new(error: &str, description: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            error_description: description,
            fields: None,
        }
    }

    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self::new("invalid_token", Some(description.into()))
    }

    pub fn forbidden(description: impl Into<String>) -> Self {
        Self::new("forbidden", Some(description.into()))
    }

    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new("not_found", Some(description.into()))
    }

    pub fn conflict(description: impl Into<String>) -> Self {
        Self::new("conflict", Some(description.into()))
    }

    pub fn validation_failed(fields: Vec<FieldError>) -> Self {
        Self {
            fields: Some(fields),
            ..Self::new("validation_failed", Some("Invalid user data".to_string()))
        }
    }

    /// A request body that could not be parsed as the expected JSON.
    pub fn malformed_body(description: impl Into<String>) -> Self {
        Self::new("validation_failed", Some(description.into()))
    }

    pub fn provisioning_failed(description: impl Into<String>) -> Self {
        Self::new("provisioning_failed", Some(description.into()))
    }

    pub fn server_error() -> Self {
        Self::new("server_error", None)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "invalid_token" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "validation_failed" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::UNAUTHORIZED {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                Json(self),
            )
                .into_response();
        }
        (status, Json(self)).into_response()
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(err: ProvisioningError) -> Self {
        match err {
            ProvisioningError::NotFound(_) => ApiError::not_found(err.to_string()),
            ProvisioningError::Conflict(message) => ApiError::conflict(message),
            ProvisioningError::Validation(fields) => ApiError::validation_failed(fields),
            ProvisioningError::ProvisioningFailed(_) => ApiError::provisioning_failed(err.to_string()),
            ProvisioningError::PasswordGeneration(_) | ProvisioningError::Store(_) => {
                tracing::error!(name = "api.users.internal", error = %err, "Request failed");
                ApiError::server_error()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::malformed_body(format!("Malformed request body: {}", rejection.body_text()))
    }
}

/// The verified caller of a request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub identity: Identity,
    pub authorities: AuthoritySet,
    /// Every claim of the verified token.
    pub claims: ClaimSet,
}

impl Principal {
    pub fn from_claims(claims: ClaimSet) -> Self {
        let identity = extract(&claims);
        let authorities = to_authorities(&identity.roles);
        Self {
            identity,
            authorities,
            claims,
        }
    }

    /// `Forbidden` unless the caller holds `role`.
    pub fn require_role(&self, role: &str) -> Result<(), ApiError> {
        if self.authorities.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("Requires role '{role}'")))
        }
    }
}

/// Axum extractor that verifies the `Authorization: Bearer <token>` header.
///
/// ```ignore
/// async fn handler(Authenticated(principal): Authenticated) -> impl IntoResponse {
///     format!("Hello, {:?}", principal.identity.username)
/// }
/// ```
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let resources = parts
            .extensions
            .get::<AppResources>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("AppResources not found in extensions");
                ApiError::server_error()
            })?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = match auth_header {
            Some(header) => match bearer_token(header) {
                Some(token) => token,
                None => {
                    return Err(ApiError::invalid_token(
                        "Authorization header must use Bearer scheme",
                    ));
                }
            },
            None => return Err(ApiError::invalid_token("Missing Authorization header")),
        };

        let claims = resources.verifier.verify(token).await.map_err(|e| {
            tracing::debug!(name = "api.auth.rejected", error = %e, "Bearer token rejected");
            ApiError::invalid_token("Invalid or expired token")
        })?;

        Ok(Authenticated(Principal::from_claims(claims)))
    }
}

/// The credentials of a `Bearer` authorization header. The scheme name is
/// case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
