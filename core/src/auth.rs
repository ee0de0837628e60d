//! Credential hasher and token issuer collaborators.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::DomainError;

/// One-way hashing of secrets such as passwords.
pub trait CredentialHasher: Send + Sync {
    /// Hashes `secret` into a self-describing digest.
    fn hash(&self, secret: &str) -> Result<String, DomainError>;

    /// Whether `secret` matches `digest`. A digest that cannot be parsed is
    /// an error, a mismatch is `Ok(false)`.
    fn compare(&self, secret: &str, digest: &str) -> Result<bool, DomainError>;
}

/// Signed bearer tokens.
pub trait TokenIssuer: Send + Sync {
    /// Issues a token for `subject` valid for `ttl`.
    fn issue(&self, subject: &str, claims: Map<String, JsonValue>, ttl: Duration) -> Result<String, DomainError>;

    /// Verifies signature and expiry; any failure is `Unauthorized`.
    fn verify(&self, token: &str) -> Result<Claims, DomainError>;
}

/// Registered claims plus whatever the issuer was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    #[serde(flatten)]
    pub data: Map<String, JsonValue>,
}
