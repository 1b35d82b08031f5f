//! Shared fixtures: in-memory database, a scripted identity provider and a
//! token verifier that maps fixed tokens to claim sets.
#![allow(dead_code)]

use async_trait::async_trait;
use auth_service::{
    AppResources,
    auth::{ClaimSet, TokenVerifier},
    config::{AppConfig, IdentityProviderConfig, JwtConfig},
    dto::UserRequest,
    error::{IdentityProviderError, TokenError},
    identity_provider::IdentityProvider,
    provisioning::ProvisioningService,
    store::SeaOrmUserStore,
};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// Create an in-memory SQLite database with the users table.
pub async fn setup_test_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT NULL,
            active BOOLEAN NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );"#,
    ))
    .await
    .expect("Failed to create users table");

    Arc::new(db)
}

/// How the fake provider answers `create_user`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
    Fails(u16),
    NoToken,
}

/// Identity provider double that records every call.
pub struct FakeIdentityProvider {
    pub create_outcome: CreateOutcome,
    pub fail_assign_role: bool,
    pub fail_delete: bool,
    pub calls: Mutex<Vec<String>>,
    pub passwords: Mutex<Vec<String>>,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self {
            create_outcome: CreateOutcome::Created,
            fail_assign_role: false,
            fail_delete: false,
            calls: Mutex::new(Vec::new()),
            passwords: Mutex::new(Vec::new()),
        }
    }
}

impl FakeIdentityProvider {
    pub fn with_create_outcome(create_outcome: CreateOutcome) -> Self {
        Self {
            create_outcome,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn admin_token(&self) -> Option<String> {
        self.record("admin_token".into());
        (self.create_outcome != CreateOutcome::NoToken).then(|| "admin-token".to_string())
    }

    async fn create_user(
        &self,
        user: &UserRequest,
        temporary_password: &str,
    ) -> Result<(), IdentityProviderError> {
        self.record(format!("create_user:{}", user.username));
        self.passwords
            .lock()
            .unwrap()
            .push(temporary_password.to_string());
        match self.create_outcome {
            CreateOutcome::Created => Ok(()),
            CreateOutcome::AlreadyExists => Err(IdentityProviderError::Conflict),
            CreateOutcome::Fails(status) => Err(IdentityProviderError::Http {
                status,
                body: "boom".into(),
            }),
            CreateOutcome::NoToken => Err(IdentityProviderError::NoAdminToken),
        }
    }

    async fn find_user_id(&self, username: &str) -> Result<Option<String>, IdentityProviderError> {
        self.record(format!("find_user_id:{username}"));
        Ok(Some(format!("remote-{username}")))
    }

    async fn find_role_id(&self, role: &str) -> Result<Option<String>, IdentityProviderError> {
        self.record(format!("find_role_id:{role}"));
        Ok(Some(format!("role-{role}")))
    }

    async fn assign_role(&self, username: &str, role: &str) -> Result<(), IdentityProviderError> {
        self.record(format!("assign_role:{username}:{role}"));
        if self.fail_assign_role {
            return Err(IdentityProviderError::RoleNotFound(role.to_string()));
        }
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<(), IdentityProviderError> {
        self.record(format!("delete_user:{username}"));
        if self.fail_delete {
            return Err(IdentityProviderError::Http {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}

pub fn provisioning_service(
    db: Arc<DatabaseConnection>,
    identity_provider: Arc<FakeIdentityProvider>,
) -> ProvisioningService {
    ProvisioningService::new(
        Arc::new(SeaOrmUserStore::new(db)),
        identity_provider,
        "USER",
    )
}

pub fn user_request(username: &str, email: &str, full_name: Option<&str>) -> UserRequest {
    UserRequest {
        username: username.to_string(),
        email: email.to_string(),
        full_name: full_name.map(String::from),
        active: None,
    }
}

pub fn claims(value: Value) -> ClaimSet {
    match value {
        Value::Object(map) => map,
        other => panic!("claims must be a JSON object, got {other}"),
    }
}

/// Accepts `admin-token` (ADMIN + USER) and `user-token` (USER only).
pub struct StaticTokenVerifier;

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        match token {
            "admin-token" => Ok(claims(json!({
                "sub": "admin-subject",
                "preferred_username": "admin",
                "email": "admin@example.com",
                "iat": 1704063600,
                "exp": 1704067200,
                "realm_access": { "roles": ["ADMIN", "USER"] }
            }))),
            "user-token" => Ok(claims(json!({
                "sub": "user-subject",
                "preferred_username": "jane",
                "realm_access": { "roles": ["USER"] },
                "resource_access": { "account": { "roles": ["view-profile"] } }
            }))),
            _ => Err(TokenError::Malformed("unknown test token".into())),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        identity_provider: IdentityProviderConfig {
            base_url: "http://localhost:8080".to_string(),
            realm: "master".to_string(),
            client_id: "auth-service".to_string(),
            client_secret: "secret".to_string(),
            default_role: "USER".to_string(),
            request_timeout_secs: 5,
        },
        jwt: JwtConfig {
            issuer_uri: "http://localhost:8080/realms/master".to_string(),
            jwks_uri: None,
            jwks_host_rewrite: None,
            leeway_secs: 60,
            request_timeout_secs: 5,
            jwks_cache_ttl_secs: 3600,
            jwks_min_refresh_secs: 60,
        },
    }
}

pub async fn test_resources(identity_provider: Arc<FakeIdentityProvider>) -> AppResources {
    let db = setup_test_db().await;
    AppResources {
        config: Arc::new(test_config()),
        verifier: Arc::new(StaticTokenVerifier),
        provisioning: Arc::new(provisioning_service(db, identity_provider)),
    }
}
