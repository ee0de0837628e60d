//! SQLite store for roster
//!
//! Implements [`roster_core::Store`] over `rusqlite`, binding every
//! [`roster_core::Value`] as a positional parameter and reporting constraint
//! violations as [`roster_core::StoreError::Constraint`].

pub mod pragma;
mod store;

pub use store::SqliteStore;
