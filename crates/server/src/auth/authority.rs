//! Role to authority mapping used by the access checks.

use std::fmt;

/// Marker every authority derived from a role carries.
pub const ROLE_PREFIX: &str = "ROLE_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Authority(String);

impl Authority {
    pub fn from_role(role: &str) -> Self {
        Self(format!("{ROLE_PREFIX}{role}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritySet(Vec<Authority>);

impl AuthoritySet {
    /// True when the set holds the authority for `role`, i.e. `ROLE_<role>`.
    pub fn has_role(&self, role: &str) -> bool {
        let wanted = Authority::from_role(role);
        self.0.contains(&wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Authority> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps each role 1:1 to `ROLE_<role>`. Role names are not validated.
pub fn to_authorities<S: AsRef<str>>(roles: &[S]) -> AuthoritySet {
    AuthoritySet(
        roles
            .iter()
            .map(|role| Authority::from_role(role.as_ref()))
            .collect(),
    )
}
