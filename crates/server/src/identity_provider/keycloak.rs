use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{IdentityProvider, split_full_name};
use crate::config::IdentityProviderConfig;
use crate::dto::UserRequest;
use crate::error::IdentityProviderError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
    temporary: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUserRepresentation<'a> {
    username: &'a str,
    email: &'a str,
    first_name: String,
    last_name: String,
    enabled: bool,
    email_verified: bool,
    credentials: [CredentialRepresentation<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct UserRepresentation {
    id: String,
    username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RoleRepresentation {
    id: String,
    name: String,
}

/// Client for the Keycloak admin REST API of one realm.
///
/// Every operation obtains a fresh service-account token first.
#[derive(Clone, Debug)]
pub struct KeycloakAdminClient {
    http: reqwest::Client,
    base_url: Url,
    realm: String,
    client_id: String,
    client_secret: String,
}

impl KeycloakAdminClient {
    pub fn new(config: &IdentityProviderConfig) -> Result<Self, IdentityProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            realm: config.realm.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// `base_url` with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, IdentityProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn admin_endpoint(&self, segments: &[&str]) -> Result<Url, IdentityProviderError> {
        let mut all = vec!["admin", "realms", self.realm.as_str()];
        all.extend_from_slice(segments);
        self.endpoint(&all)
    }

    async fn request_admin_token(&self) -> Result<String, IdentityProviderError> {
        if self.client_secret.trim().is_empty() {
            return Err(IdentityProviderError::MissingClientSecret);
        }

        let url = self.endpoint(&[
            "realms",
            self.realm.as_str(),
            "protocol",
            "openid-connect",
            "token",
        ])?;
        let response = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn require_token(&self) -> Result<String, IdentityProviderError> {
        self.request_admin_token().await.map_err(|e| {
            log_token_failure(&e, &self.client_id);
            IdentityProviderError::NoAdminToken
        })
    }

    async fn lookup_user_id(
        &self,
        token: &str,
        username: &str,
    ) -> Result<Option<String>, IdentityProviderError> {
        let mut url = self.admin_endpoint(&["users"])?;
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("exact", "true");

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let users: Vec<UserRepresentation> = check_status(response).await?.json().await?;

        // Keycloak stores usernames lower-cased.
        Ok(users
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .map(|u| u.id))
    }

    async fn lookup_role(
        &self,
        token: &str,
        role: &str,
    ) -> Result<Option<RoleRepresentation>, IdentityProviderError> {
        let url = self.admin_endpoint(&["roles", role])?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check_status(response).await?.json().await?))
    }
}

fn log_token_failure(err: &IdentityProviderError, client_id: &str) {
    match err {
        IdentityProviderError::MissingClientSecret => tracing::error!(
            name = "identity_provider.token.missing_secret",
            client_id,
            "Client secret is not configured; set identity_provider.client_secret"
        ),
        IdentityProviderError::Unauthorized(status) => tracing::error!(
            name = "identity_provider.token.rejected",
            client_id,
            status,
            "Identity provider rejected the client credentials; check client id, secret and service-account settings"
        ),
        IdentityProviderError::Network(e) => tracing::error!(
            name = "identity_provider.token.unreachable",
            client_id,
            error = %e,
            "Identity provider is unreachable"
        ),
        other => tracing::error!(
            name = "identity_provider.token.failed",
            client_id,
            error = %other,
            "Failed to obtain an admin token"
        ),
    }
}

/// Maps non-success responses onto [`IdentityProviderError`].
async fn check_status(response: Response) -> Result<Response, IdentityProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::CONFLICT => Err(IdentityProviderError::Conflict),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(IdentityProviderError::Unauthorized(status.as_u16()))
        }
        _ => Err(IdentityProviderError::Http {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl IdentityProvider for KeycloakAdminClient {
    async fn admin_token(&self) -> Option<String> {
        self.require_token().await.ok()
    }

    #[tracing::instrument(skip(self, user, temporary_password), fields(username = %user.username))]
    async fn create_user(
        &self,
        user: &UserRequest,
        temporary_password: &str,
    ) -> Result<(), IdentityProviderError> {
        let token = self.require_token().await?;
        let (first_name, last_name) = split_full_name(user.full_name.as_deref());
        let body = NewUserRepresentation {
            username: &user.username,
            email: &user.email,
            first_name,
            last_name,
            enabled: user.active.unwrap_or(true),
            email_verified: false,
            credentials: [CredentialRepresentation {
                kind: "password",
                value: temporary_password,
                temporary: true,
            }],
        };

        let url = self.admin_endpoint(&["users"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        match check_status(response).await {
            Ok(_) => {
                tracing::info!(name = "identity_provider.create_user.created", "Remote user created");
                Ok(())
            }
            Err(IdentityProviderError::Conflict) => {
                tracing::warn!(
                    name = "identity_provider.create_user.exists",
                    "Remote user already exists"
                );
                Err(IdentityProviderError::Conflict)
            }
            Err(e) => Err(e),
        }
    }

    async fn find_user_id(&self, username: &str) -> Result<Option<String>, IdentityProviderError> {
        let token = self.require_token().await?;
        self.lookup_user_id(&token, username).await
    }

    async fn find_role_id(&self, role: &str) -> Result<Option<String>, IdentityProviderError> {
        let token = self.require_token().await?;
        Ok(self.lookup_role(&token, role).await?.map(|r| r.id))
    }

    #[tracing::instrument(skip(self))]
    async fn assign_role(&self, username: &str, role: &str) -> Result<(), IdentityProviderError> {
        let token = self.require_token().await?;
        let user_id = self
            .lookup_user_id(&token, username)
            .await?
            .ok_or_else(|| IdentityProviderError::UserNotFound(username.to_string()))?;
        let role = self
            .lookup_role(&token, role)
            .await?
            .ok_or_else(|| IdentityProviderError::RoleNotFound(role.to_string()))?;

        let url = self.admin_endpoint(&["users", user_id.as_str(), "role-mappings", "realm"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&[&role])
            .send()
            .await?;
        check_status(response).await?;

        tracing::info!(
            name = "identity_provider.assign_role.assigned",
            role = %role.name,
            "Realm role assigned"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, username: &str) -> Result<(), IdentityProviderError> {
        let token = self.require_token().await?;
        let user_id = self
            .lookup_user_id(&token, username)
            .await?
            .ok_or_else(|| IdentityProviderError::UserNotFound(username.to_string()))?;

        let url = self.admin_endpoint(&["users", user_id.as_str()])?;
        let response = self.http.delete(url).bearer_auth(&token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IdentityProviderError::UserNotFound(username.to_string()));
        }
        check_status(response).await?;

        tracing::info!(name = "identity_provider.delete_user.deleted", "Remote user deleted");
        Ok(())
    }
}
