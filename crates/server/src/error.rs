use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("No signing key with id {0:?} in the JWK set")]
    UnknownKey(Option<String>),
    #[error("Unusable signing key: {0}")]
    InvalidKey(String),
    #[error("Failed to fetch JWK set: {0}")]
    KeySet(String),
    #[error("Token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum IdentityProviderError {
    #[error("Identity provider client secret is not configured")]
    MissingClientSecret,
    #[error("Could not obtain an admin token from the identity provider")]
    NoAdminToken,
    #[error("User already exists in the identity provider")]
    Conflict,
    #[error("Identity provider refused the admin credentials (HTTP {0})")]
    Unauthorized(u16),
    #[error("User '{0}' not found in the identity provider")]
    UserNotFound(String),
    #[error("Role '{0}' not found in the identity provider")]
    RoleNotFound(String),
    #[error("Identity provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Identity provider request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid identity provider URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("Row {0} does not exist")]
    Missing(i64),
    #[error(transparent)]
    Db(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::UniqueViolation(detail),
            _ => StoreError::Db(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("User not found with id {0}")]
    NotFound(i64),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid user data")]
    Validation(Vec<FieldError>),
    #[error("Failed to create user in the identity provider: {0}")]
    ProvisioningFailed(#[source] IdentityProviderError),
    #[error("Failed to generate temporary password: {0}")]
    PasswordGeneration(String),
    #[error("User store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ProvisioningError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(detail) => {
                ProvisioningError::Conflict(format!("Username or email already exists ({detail})"))
            }
            StoreError::Missing(id) => ProvisioningError::NotFound(id),
            other => ProvisioningError::Store(other),
        }
    }
}
