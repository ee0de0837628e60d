//! # Roster
//!
//! Membership and points tracking for a student organization: users, roles,
//! events, event types, attendance records and announcements, exposed as
//! REST-shaped controller actions over a descriptor-driven resource layer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roster::api::Request;
//! use roster::config::Config;
//!
//! # fn main() -> Result<(), roster::Error> {
//! let config = Config::load()?;
//! let api = roster::open(&config)?;
//!
//! let response = api.events().index(&Request::query("embed=type&pointsMin=1"));
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! | Crate / module     | Role                                                   |
//! |--------------------|--------------------------------------------------------|
//! | `roster-core`      | Descriptors, filters, relations, guard, engine         |
//! | `roster-sqlite`    | [`roster_core::Store`] over `rusqlite`                 |
//! | [`models`]         | The six domain models and their relations              |
//! | [`schema`]         | DDL and seeded roles                                   |
//! | [`api`]            | Controllers, access control and body validation        |
//! | [`credentials`]    | Argon2 password hashing and HS256 bearer tokens        |
//! | [`config`]         | `roster.toml` plus environment overrides               |

pub mod api;
pub mod config;
pub mod credentials;
pub mod models;
pub mod schema;

use std::sync::Arc;

pub use api::{Api, Request, Response};
pub use config::Config;
pub use models::{Models, Role};
pub use roster_core as core;
pub use roster_sqlite::SqliteStore;

use credentials::{Argon2Hasher, JwtIssuer};
use roster_core::{SchemaError, StoreError};

/// Failure while bringing the service up.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("password hasher: {0}")]
    Hasher(argon2::Error),
}

/// Opens the configured database, installs the tables and wires the
/// credential collaborators into an [`Api`].
pub fn open(config: &Config) -> Result<Api<SqliteStore>, Error> {
    let store = if config.database == ":memory:" {
        SqliteStore::open_in_memory()?
    } else {
        SqliteStore::open(&config.database)?
    };
    schema::install(&store)?;

    let hasher = Argon2Hasher::new(config.auth.hash_memory_kib, config.auth.hash_iterations)
        .map_err(Error::Hasher)?;
    let issuer = JwtIssuer::new(config.secret());

    #[cfg(feature = "tracing")]
    tracing::info!(database = %config.database, "roster.open");

    Ok(Api::new(
        store,
        Arc::new(hasher),
        Arc::new(issuer),
        config.token_ttl(),
    )?)
}
