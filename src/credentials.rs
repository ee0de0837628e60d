//! Argon2 credential hashing and HS256 bearer tokens.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm as Argon2Algorithm, Argon2, Params, Version};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use roster_core::{Claims, CredentialHasher, DomainError, TokenIssuer};
use serde_json::{Map, Value as JsonValue};

// ============================================================================
// Argon2Hasher
// ============================================================================

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`).
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// `memory_kib` and `iterations` are the Argon2 `m` and `t` costs.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, argon2::Error> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("password hashing failed: {e}")))
    }

    fn compare(&self, secret: &str, digest: &str) -> Result<bool, DomainError> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| DomainError::internal(format!("stored digest is invalid: {e}")))?;
        // Parameters are read from the digest itself.
        Ok(self
            .argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }
}

// ============================================================================
// JwtIssuer
// ============================================================================

/// HS256 JSON Web Tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer").finish_non_exhaustive()
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl TokenIssuer for JwtIssuer {
    fn issue(
        &self,
        subject: &str,
        mut claims: Map<String, JsonValue>,
        ttl: Duration,
    ) -> Result<String, DomainError> {
        // Registered claims are owned by the issuer.
        for reserved in ["sub", "iat", "exp"] {
            claims.remove(reserved);
        }
        let iat = now();
        let claims = Claims {
            sub: subject.to_owned(),
            iat,
            exp: iat + ttl.as_secs(),
            data: claims,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::internal(format!("token signing failed: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Claims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::unauthorized(format!("Token is invalid: {e}.")))
    }
}
