//! Mapping of a verified claim set to an [`Identity`].
//!
//! Roles can live in three places of a Keycloak-style token:
//!
//! - `realm_access.roles` (realm roles)
//! - `roles` (top-level, used by other providers and custom mappers)
//! - `resource_access.<client>.roles` (client roles, one list per client)
//!
//! All of them are merged into a single list. A claim of any other shape is
//! ignored rather than reported, so a malformed role claim yields fewer roles
//! and never a failed request.

use serde::Serialize;
use serde_json::{Map, Value};

/// Verified token payload as returned by the token verifier.
pub type ClaimSet = Map<String, Value>;

/// Normalized caller identity, derived per request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Union of all role claims. Order follows the claim locations above;
    /// duplicates are kept.
    pub roles: Vec<String>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

/// A role-bearing claim, one variant per recognised location.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RoleClaim<'a> {
    Realm(&'a Value),
    TopLevel(&'a Value),
    Client { client: &'a str, roles: &'a Value },
}

impl<'a> RoleClaim<'a> {
    fn roles(self) -> &'a Value {
        match self {
            RoleClaim::Realm(roles) | RoleClaim::TopLevel(roles) => roles,
            RoleClaim::Client { roles, .. } => roles,
        }
    }
}

fn role_claims(claims: &ClaimSet) -> Vec<RoleClaim<'_>> {
    let mut found = Vec::new();

    if let Some(roles) = claims
        .get("realm_access")
        .and_then(Value::as_object)
        .and_then(|access| access.get("roles"))
    {
        found.push(RoleClaim::Realm(roles));
    }

    if let Some(roles) = claims.get("roles") {
        found.push(RoleClaim::TopLevel(roles));
    }

    if let Some(resources) = claims.get("resource_access").and_then(Value::as_object) {
        for (client, access) in resources {
            if let Some(roles) = access.as_object().and_then(|a| a.get("roles")) {
                found.push(RoleClaim::Client { client, roles });
            }
        }
    }

    found
}

/// Strings of a JSON array; anything else contributes nothing.
fn string_list(value: &Value) -> impl Iterator<Item = &str> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn string_claim(claims: &ClaimSet, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(String::from)
}

fn timestamp_claim(claims: &ClaimSet, name: &str) -> Option<i64> {
    let value = claims.get(name)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64))
}

/// Extracts every role from the recognised claim locations.
pub fn extract_roles(claims: &ClaimSet) -> Vec<String> {
    let mut roles = Vec::new();
    for claim in role_claims(claims) {
        if let RoleClaim::Client { client, .. } = claim {
            tracing::trace!(client, "reading client roles");
        }
        roles.extend(string_list(claim.roles()).map(String::from));
    }
    roles
}

/// Builds the caller [`Identity`] from a verified claim set.
pub fn extract(claims: &ClaimSet) -> Identity {
    let identity = Identity {
        subject: string_claim(claims, "sub"),
        username: string_claim(claims, "preferred_username"),
        email: string_claim(claims, "email"),
        roles: extract_roles(claims),
        issued_at: timestamp_claim(claims, "iat"),
        expires_at: timestamp_claim(claims, "exp"),
    };
    tracing::debug!(roles = ?identity.roles, "extracted identity from token");
    identity
}
