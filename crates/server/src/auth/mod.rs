//! Token verification and the mapping from claims to authorities.

pub mod authority;
pub mod claims;
pub mod verifier;

pub use authority::{Authority, AuthoritySet, ROLE_PREFIX, to_authorities};
pub use claims::{ClaimSet, Identity, extract, extract_roles};
pub use verifier::{JwksTokenVerifier, TokenVerifier};
