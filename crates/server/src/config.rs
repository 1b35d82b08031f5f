use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Connection details for the identity provider's admin API.
#[derive(Clone, Debug, Deserialize)]
pub struct IdentityProviderConfig {
    /// Base URL of the provider, e.g. `http://keycloak-service:8080`.
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    /// Secret of the service-account client. Left empty, every admin call
    /// fails with a diagnostic instead of the process refusing to start.
    #[serde(default)]
    pub client_secret: String,
    /// Realm role assigned to every user created through the API.
    #[serde(default = "default_role")]
    pub default_role: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl IdentityProviderConfig {
    pub fn has_client_secret(&self) -> bool {
        !self.client_secret.trim().is_empty()
    }
}

/// Maps the externally visible provider host to the one reachable from this
/// service, e.g. `localhost:8080` -> `keycloak-service:8080`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct HostRewrite {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct JwtConfig {
    /// Issuer every accepted token must carry, exactly as the provider emits it.
    pub issuer_uri: String,
    /// Explicit JWK set location. When absent it is derived from the issuer.
    #[serde(default)]
    pub jwks_uri: Option<String>,
    #[serde(default)]
    pub jwks_host_rewrite: Option<HostRewrite>,
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long a fetched JWK set is trusted before it is fetched again.
    #[serde(default = "default_jwks_cache_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
    /// Minimum gap between refetches caused by tokens with an unknown `kid`.
    #[serde(default = "default_jwks_min_refresh_secs")]
    pub jwks_min_refresh_secs: u64,
}

impl JwtConfig {
    /// Resolves the URL the JWK set is fetched from.
    ///
    /// Keycloak publishes its keys under `<issuer>/protocol/openid-connect/certs`.
    /// The host rewrite only touches the fetch location; tokens are still
    /// validated against `issuer_uri`.
    pub fn resolved_jwks_uri(&self) -> Result<Url, ConfigError> {
        let raw = match &self.jwks_uri {
            Some(uri) => uri.clone(),
            None => format!(
                "{}/protocol/openid-connect/certs",
                self.issuer_uri.trim_end_matches('/')
            ),
        };
        let mut url = Url::parse(&raw)
            .map_err(|e| ConfigError::Validation(format!("Invalid JWK set URL '{raw}': {e}")))?;

        if let Some(rewrite) = &self.jwks_host_rewrite {
            if authority(&url) == rewrite.from {
                let (host, port) = split_authority(&rewrite.to)?;
                url.set_host(Some(host)).map_err(|e| {
                    ConfigError::Validation(format!("Invalid rewrite host '{host}': {e}"))
                })?;
                url.set_port(port).map_err(|_| {
                    ConfigError::Validation(format!("Cannot set port on '{}'", rewrite.to))
                })?;
            }
        }
        Ok(url)
    }
}

fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

fn split_authority(value: &str) -> Result<(&str, Option<u16>), ConfigError> {
    match value.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|e| ConfigError::Validation(format!("Invalid port in '{value}': {e}")))?;
            Ok((host, Some(port)))
        }
        None => Ok((value, None)),
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    pub identity_provider: IdentityProviderConfig,
    pub jwt: JwtConfig,
}

fn default_role() -> String {
    "USER".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_leeway_secs() -> u64 {
    60
}

fn default_jwks_cache_ttl_secs() -> u64 {
    3600
}

fn default_jwks_min_refresh_secs() -> u64 {
    60
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8081))
}

impl AppConfig {
    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("database_url", &self.database_url),
            ("identity_provider.base_url", &self.identity_provider.base_url),
            ("identity_provider.realm", &self.identity_provider.realm),
            ("identity_provider.client_id", &self.identity_provider.client_id),
            ("jwt.issuer_uri", &self.jwt.issuer_uri),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }

        Url::parse(&self.identity_provider.base_url).map_err(|e| {
            ConfigError::Validation(format!("identity_provider.base_url is not a URL: {e}"))
        })?;
        Url::parse(&self.jwt.issuer_uri)
            .map_err(|e| ConfigError::Validation(format!("jwt.issuer_uri is not a URL: {e}")))?;
        self.jwt.resolved_jwks_uri()?;

        if self.identity_provider.request_timeout_secs == 0 || self.jwt.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Any environment variable matching the key path separated by double
/// underscores (e.g. `IDENTITY_PROVIDER__CLIENT_SECRET`) overrides the file value.
/// A `.env` file in the working directory is honoured as well.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};

    // Missing .env is the normal case outside local development.
    let _ = dotenvy::dotenv();

    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;

    if !app.identity_provider.has_client_secret() {
        tracing::warn!(
            client_id = %app.identity_provider.client_id,
            "identity_provider.client_secret is not set; user provisioning will fail until it is configured"
        );
    }

    Ok(app)
}

/// Convenience helper for binaries wanting the panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
