//! Bearer token verification against the identity provider's JWK set.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use tokio::sync::RwLock;
use url::Url;

use super::claims::ClaimSet;
use crate::config::{ConfigError, JwtConfig};
use crate::error::TokenError;

/// Turns a bearer token into a verified claim set.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<ClaimSet, TokenError>;
}

/// Verifies signature, expiry and issuer using keys from a remote JWK set.
///
/// A fetched key set is trusted for `jwks_cache_ttl_secs`. A token signed with
/// a `kid` the cached set does not know triggers a refetch, which picks up key
/// rotation, but at most once per `jwks_min_refresh_secs`.
pub struct JwksTokenVerifier {
    http: reqwest::Client,
    jwks_uri: Url,
    issuer: String,
    leeway: u64,
    cache_ttl: Duration,
    min_refresh: Duration,
    keys: RwLock<Option<CachedKeys>>,
}

struct CachedKeys {
    jwks: JwkSet,
    fetched_at: Instant,
    expires_at: Instant,
}

impl CachedKeys {
    /// `Ok(Some)` on a hit, `Ok(None)` when the set must be refetched.
    fn lookup(&self, kid: Option<&str>, min_refresh: Duration) -> Result<Option<Jwk>, TokenError> {
        if Instant::now() >= self.expires_at {
            return Ok(None);
        }
        match select_key(&self.jwks, kid) {
            Some(jwk) => Ok(Some(jwk.clone())),
            None if self.fetched_at.elapsed() < min_refresh => {
                Err(TokenError::UnknownKey(kid.map(String::from)))
            }
            None => Ok(None),
        }
    }
}

impl JwksTokenVerifier {
    pub fn new(config: &JwtConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            jwks_uri: config.resolved_jwks_uri()?,
            issuer: config.issuer_uri.clone(),
            leeway: config.leeway_secs,
            cache_ttl: Duration::from_secs(config.jwks_cache_ttl_secs),
            min_refresh: Duration::from_secs(config.jwks_min_refresh_secs),
            keys: RwLock::new(None),
        })
    }

    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    #[tracing::instrument(skip(self), fields(jwks_uri = %self.jwks_uri))]
    async fn fetch_keys(&self) -> Result<JwkSet, TokenError> {
        let response = self
            .http
            .get(self.jwks_uri.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to fetch JWK set");
                TokenError::KeySet(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(TokenError::KeySet(format!("HTTP {}", response.status())));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| TokenError::KeySet(format!("invalid JWK set: {e}")))?;
        tracing::debug!(keys = jwks.keys.len(), "Fetched JWK set");
        Ok(jwks)
    }

    async fn signing_key(&self, kid: Option<&str>) -> Result<Jwk, TokenError> {
        {
            let keys = self.keys.read().await;
            if let Some(cached) = keys.as_ref()
                && let Some(jwk) = cached.lookup(kid, self.min_refresh)?
            {
                return Ok(jwk);
            }
        }

        let mut keys = self.keys.write().await;
        // Another request may have refreshed the set while this one waited.
        if let Some(cached) = keys.as_ref()
            && let Some(jwk) = cached.lookup(kid, self.min_refresh)?
        {
            return Ok(jwk);
        }

        let jwks = self.fetch_keys().await?;
        let found = select_key(&jwks, kid).cloned();
        let fetched_at = Instant::now();
        *keys = Some(CachedKeys {
            jwks,
            fetched_at,
            expires_at: fetched_at + self.cache_ttl,
        });
        found.ok_or_else(|| TokenError::UnknownKey(kid.map(String::from)))
    }
}

/// Picks the key named by `kid`, or the only signing key when the token has
/// no `kid`. Encryption keys are never used for signatures.
fn select_key<'a>(set: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    let mut signing = set
        .keys
        .iter()
        .filter(|k| !matches!(k.common.public_key_use, Some(PublicKeyUse::Encryption)));
    match kid {
        Some(kid) => signing.find(|k| k.common.key_id.as_deref() == Some(kid)),
        None => {
            let first = signing.next();
            if signing.next().is_some() { None } else { first }
        }
    }
}

#[async_trait]
impl TokenVerifier for JwksTokenVerifier {
    async fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let header = decode_header(token).map_err(|e| TokenError::Malformed(e.to_string()))?;
        let jwk = self.signing_key(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        // The key family must match the header algorithm; jsonwebtoken
        // rejects e.g. an HS256 header against an RSA key.
        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_aud = false;
        validation.leeway = self.leeway;

        let data = decode::<ClaimSet>(token, &key, &validation)?;
        Ok(data.claims)
    }
}
