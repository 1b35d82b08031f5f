//! OpenAPI/Utoipa configuration.

use crate::api::{health::MISC_TAG, profile::PROFILE_TAG, users::USERS_TAG};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    #[tracing::instrument(skip(self, openapi))]
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .description(Some(
                    "Access token issued by the identity provider for the configured realm.",
                ))
                .build();
            components.add_security_scheme("Authorization", SecurityScheme::Http(bearer));
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Auth Service API",
        version = "1.0.0",
        description = "Token-protected profile lookup and user provisioning backed by an OAuth2 identity provider."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = PROFILE_TAG, description = "Caller identity derived from the bearer token"),
        (name = USERS_TAG, description = "User management, kept in sync with the identity provider")
    )
)]
pub struct ApiDoc;
