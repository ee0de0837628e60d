//! Service configuration
//!
//! Loaded from `roster.toml`:
//!
//! ```toml
//! database = "roster.db"
//!
//! [auth]
//! secret = "change-me"
//! token_ttl = 172800
//! ```
//!
//! The token secret may instead come from `ROSTER_JWT_SECRET`, which also
//! overrides the file. A `.env` file next to the process is honored.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "roster.toml";
pub const SECRET_ENV: &str = "ROSTER_JWT_SECRET";

const DEFAULT_DATABASE: &str = "roster.db";
/// Two days.
const DEFAULT_TOKEN_TTL: u64 = 2 * 24 * 60 * 60;

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQLite database path, or `:memory:`
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Token signing secret
    #[serde(default)]
    pub secret: Option<String>,

    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl: u64,

    /// Argon2 memory cost in KiB
    #[serde(default = "default_hash_memory")]
    pub hash_memory_kib: u32,

    /// Argon2 iteration count
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl: DEFAULT_TOKEN_TTL,
            hash_memory_kib: default_hash_memory(),
            hash_iterations: default_hash_iterations(),
        }
    }
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_owned()
}

const fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL
}

const fn default_hash_memory() -> u32 {
    argon2::Params::DEFAULT_M_COST
}

const fn default_hash_iterations() -> u32 {
    argon2::Params::DEFAULT_T_COST
}

impl Config {
    /// Load from the default config file, after reading `.env`
    pub fn load() -> Result<Self, Error> {
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load from specific path
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.into())
            } else {
                Error::Io(path.into(), e)
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|e| Error::Parse(path.into(), e))?;
        config.finish(std::env::var(SECRET_ENV).ok())
    }

    /// Parse from TOML text
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Parse(PathBuf::from("<inline>"), e))?;
        config.finish(std::env::var(SECRET_ENV).ok())
    }

    /// Applies the environment secret and validates.
    fn finish(mut self, env_secret: Option<String>) -> Result<Self, Error> {
        if let Some(secret) = env_secret.filter(|s| !s.is_empty()) {
            self.auth.secret = Some(secret);
        }
        if self.auth.secret.as_deref().is_none_or(str::is_empty) {
            return Err(Error::MissingSecret);
        }
        Ok(self)
    }

    pub fn secret(&self) -> &str {
        self.auth.secret.as_deref().unwrap_or_default()
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.token_ttl)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("no token secret: set [auth] secret or {SECRET_ENV}")]
    MissingSecret,
}

pub type ConfigError = Error;

// ============================================================================
// Tests
// ============================================================================
