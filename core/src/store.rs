//! The relational store collaborator.

use std::sync::Arc;

use crate::error::StoreError;
use crate::sql::SQL;
use crate::value::{Attributes, EntityId};

/// A fetched row, keyed by column name.
pub type Row = Attributes;

/// Executes parameterized statements against a relational database.
///
/// Constraint violations must surface as [`StoreError::Constraint`] so the
/// engine can report them as `NotModified` rather than as internal failures.
pub trait Store {
    /// Runs a `SELECT` and returns every row.
    fn query(&self, sql: &SQL) -> Result<Vec<Row>, StoreError>;

    /// Runs an `UPDATE` or `DELETE` and returns the affected-row count.
    fn execute(&self, sql: &SQL) -> Result<usize, StoreError>;

    /// Runs an `INSERT` and returns the new row's identifier, or `None` when
    /// nothing was inserted.
    fn insert(&self, sql: &SQL) -> Result<Option<EntityId>, StoreError>;
}

impl<S: Store + ?Sized> Store for &S {
    fn query(&self, sql: &SQL) -> Result<Vec<Row>, StoreError> {
        (**self).query(sql)
    }

    fn execute(&self, sql: &SQL) -> Result<usize, StoreError> {
        (**self).execute(sql)
    }

    fn insert(&self, sql: &SQL) -> Result<Option<EntityId>, StoreError> {
        (**self).insert(sql)
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn query(&self, sql: &SQL) -> Result<Vec<Row>, StoreError> {
        (**self).query(sql)
    }

    fn execute(&self, sql: &SQL) -> Result<usize, StoreError> {
        (**self).execute(sql)
    }

    fn insert(&self, sql: &SQL) -> Result<Option<EntityId>, StoreError> {
        (**self).insert(sql)
    }
}
