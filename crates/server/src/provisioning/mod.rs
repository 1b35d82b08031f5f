//! User provisioning across the local store and the identity provider.
//!
//! Ordering rules:
//!
//! - create: local pre-check, remote create, best-effort role grant, local insert
//! - update: local only
//! - delete: local delete, then best-effort remote delete
//!
//! The local store is authoritative. A failed remote create aborts before any
//! local write; every other remote failure is logged and dropped.

pub mod password;

use std::sync::Arc;

use crate::dto::{TEMPORARY_PASSWORD_MESSAGE, UserCreateResponse, UserRequest, UserResponse};
use crate::error::{IdentityProviderError, ProvisioningError};
use crate::identity_provider::IdentityProvider;
use crate::store::{NewUser, UserChanges, UserStore};
use crate::validation::user::validate_user_request;

pub use password::generate_temporary_password;

#[derive(Clone)]
pub struct ProvisioningService {
    store: Arc<dyn UserStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    default_role: String,
}

impl ProvisioningService {
    pub fn new(
        store: Arc<dyn UserStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        default_role: impl Into<String>,
    ) -> Self {
        Self {
            store,
            identity_provider,
            default_role: default_role.into(),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ProvisioningError> {
        let users = self.store.find_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, id: i64) -> Result<UserResponse, ProvisioningError> {
        self.store
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(ProvisioningError::NotFound(id))
    }

    /// Provisions a user remotely and locally and returns the one-time
    /// temporary password.
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_user(
        &self,
        request: UserRequest,
    ) -> Result<UserCreateResponse, ProvisioningError> {
        validate_user_request(&request).map_err(ProvisioningError::Validation)?;

        if self.store.exists_by_username(&request.username).await? {
            return Err(ProvisioningError::Conflict(format!(
                "Username '{}' already exists",
                request.username
            )));
        }
        if self.store.exists_by_email(&request.email).await? {
            return Err(ProvisioningError::Conflict(format!(
                "Email '{}' already exists",
                request.email
            )));
        }

        let temporary_password = generate_temporary_password()
            .map_err(|e| ProvisioningError::PasswordGeneration(e.to_string()))?;

        match self
            .identity_provider
            .create_user(&request, &temporary_password)
            .await
        {
            Ok(()) => {}
            Err(IdentityProviderError::Conflict) => {
                tracing::warn!(
                    name = "provisioning.create.remote_exists",
                    "User already exists in the identity provider, continuing"
                );
            }
            Err(e) => {
                tracing::error!(
                    name = "provisioning.create.remote_failed",
                    error = %e,
                    "Remote user creation failed; nothing was stored locally"
                );
                return Err(ProvisioningError::ProvisioningFailed(e));
            }
        }

        if let Err(e) = self
            .identity_provider
            .assign_role(&request.username, &self.default_role)
            .await
        {
            tracing::warn!(
                name = "provisioning.create.role_failed",
                role = %self.default_role,
                error = %e,
                "Default role assignment failed"
            );
        }

        let new_user = NewUser {
            username: request.username.clone(),
            email: request.email.clone(),
            full_name: request.full_name.clone(),
            active: request.active.unwrap_or(true),
        };
        let user = self.store.insert(new_user).await.map_err(|e| {
            let err = ProvisioningError::from(e);
            // The remote account is not rolled back.
            tracing::warn!(
                name = "provisioning.create.local_failed",
                error = %err,
                "Local insert failed after the remote user was provisioned"
            );
            err
        })?;

        tracing::info!(
            name = "provisioning.create.done",
            user_id = user.id,
            "User provisioned"
        );

        Ok(UserCreateResponse {
            user: user.into(),
            temporary_password,
            message: TEMPORARY_PASSWORD_MESSAGE.to_string(),
        })
    }

    /// Applies `request` to the local row. The identity provider is untouched.
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn update_user(
        &self,
        id: i64,
        request: UserRequest,
    ) -> Result<UserResponse, ProvisioningError> {
        validate_user_request(&request).map_err(ProvisioningError::Validation)?;

        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ProvisioningError::NotFound(id))?;

        if existing.username != request.username
            && self.store.exists_by_username(&request.username).await?
        {
            return Err(ProvisioningError::Conflict(format!(
                "Username '{}' already exists",
                request.username
            )));
        }
        if existing.email != request.email && self.store.exists_by_email(&request.email).await? {
            return Err(ProvisioningError::Conflict(format!(
                "Email '{}' already exists",
                request.email
            )));
        }

        let changes = UserChanges {
            username: request.username,
            email: request.email,
            full_name: request.full_name,
            active: request.active,
        };
        let user = self.store.update(id, changes).await?;
        Ok(user.into())
    }

    /// Removes the local row, then the remote user on a best-effort basis.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<(), ProvisioningError> {
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ProvisioningError::NotFound(id))?;

        if !self.store.delete(id).await? {
            return Err(ProvisioningError::NotFound(id));
        }

        if let Err(e) = self.identity_provider.delete_user(&existing.username).await {
            tracing::warn!(
                name = "provisioning.delete.remote_failed",
                username = %existing.username,
                error = %e,
                "Remote user deletion failed; local user was removed"
            );
        }

        Ok(())
    }
}
