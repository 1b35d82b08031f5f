//! A token-validating user provisioning service.
//!
//! Verifies bearer tokens issued by an OAuth2/OIDC identity provider, maps
//! their role claims to authorities, and manages users in a local database
//! while keeping the provider's user store in sync.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::provisioning::ProvisioningService;

pub mod api;
pub mod auth;
pub mod config;
pub mod dto;
pub mod entity;
pub mod error;
pub mod identity_provider;
pub mod provisioning;
pub mod store;
pub mod validation;

#[derive(Clone)]
pub struct AppResources {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub provisioning: Arc<ProvisioningService>,
}
