//! Admin-scoped access to the remote identity provider.
//!
//! The provisioning workflow only talks to [`IdentityProvider`]; the production
//! implementation is [`KeycloakAdminClient`]. Remote users are always resolved
//! by username, no provider-side id is kept between calls.

mod keycloak;
mod name;

use async_trait::async_trait;

pub use keycloak::KeycloakAdminClient;
pub use name::split_full_name;

use crate::dto::UserRequest;
use crate::error::IdentityProviderError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Service-account token from a client-credentials grant. `None` covers
    /// every failure; the cause is only logged.
    async fn admin_token(&self) -> Option<String>;

    /// Creates the remote user with `temporary_password` as a credential that
    /// must be changed on first login. An existing user is
    /// `IdentityProviderError::Conflict`.
    async fn create_user(
        &self,
        user: &UserRequest,
        temporary_password: &str,
    ) -> Result<(), IdentityProviderError>;

    async fn find_user_id(&self, username: &str) -> Result<Option<String>, IdentityProviderError>;

    async fn find_role_id(&self, role: &str) -> Result<Option<String>, IdentityProviderError>;

    /// Grants the realm role `role` to `username`.
    async fn assign_role(&self, username: &str, role: &str) -> Result<(), IdentityProviderError>;

    async fn delete_user(&self, username: &str) -> Result<(), IdentityProviderError>;
}
