use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, ErrorCode, params_from_iter};
use roster_core::{EntityId, Row, SQL, Store, StoreError, Value};

use crate::pragma::Pragma;

/// [`Store`] over a single rusqlite connection.
///
/// The connection is serialized behind a mutex so one store can be shared by
/// every request handler.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database file with foreign keys enforced.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.pragma(Pragma::ForeignKeys(true))?;
        Ok(store)
    }

    /// Applies a connection setting.
    pub fn pragma(&self, pragma: Pragma) -> Result<(), StoreError> {
        self.execute_batch(&pragma.to_sql().sql())
    }

    /// Runs semicolon-separated statements without parameters, e.g. DDL.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        roster_core::roster_trace_query!(sql, 0);
        self.conn()?.execute_batch(sql).map_err(map_error)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Connection("connection mutex poisoned".into()))
    }
}

impl Store for SqliteStore {
    fn query(&self, sql: &SQL) -> Result<Vec<Row>, StoreError> {
        let text = sql.sql();
        let params: Vec<&Value> = sql.params().collect();
        roster_core::roster_trace_query!(&text, params.len());

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&text).map_err(map_error)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();

        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| Ok((name.clone(), row.get::<_, Value>(idx)?)))
                    .collect::<rusqlite::Result<Row>>()
            })
            .map_err(map_error)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_error)
    }

    fn execute(&self, sql: &SQL) -> Result<usize, StoreError> {
        let text = sql.sql();
        let params: Vec<&Value> = sql.params().collect();
        roster_core::roster_trace_query!(&text, params.len());

        self.conn()?
            .execute(&text, params_from_iter(params))
            .map_err(map_error)
    }

    fn insert(&self, sql: &SQL) -> Result<Option<EntityId>, StoreError> {
        let text = sql.sql();
        let params: Vec<&Value> = sql.params().collect();
        roster_core::roster_trace_query!(&text, params.len());

        let conn = self.conn()?;
        let inserted = conn
            .execute(&text, params_from_iter(params))
            .map_err(map_error)?;
        Ok((inserted > 0).then(|| EntityId::new(conn.last_insert_rowid())))
    }
}

/// Constraint violations become [`StoreError::Constraint`]; everything else
/// passes through.
fn map_error(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreError::Constraint(err.to_string()),
        _ => StoreError::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::{Attributes, sql};

    fn setup() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .execute_batch(
                r#"
                CREATE TABLE "roles" ("id" INTEGER PRIMARY KEY, "name" TEXT NOT NULL UNIQUE);
                CREATE TABLE "users" (
                    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                    "name" TEXT NOT NULL,
                    "score" REAL,
                    "role_id" INTEGER REFERENCES "roles" ("id")
                );
                INSERT INTO "roles" ("id", "name") VALUES (1, 'member');
                "#,
            )
            .unwrap();
        store
    }

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn inserts_and_reads_back_rows() {
        let store = setup();
        let id = store
            .insert(&sql::insert(
                "users",
                &attrs(&[("name", "Ana".into()), ("score", 1.5.into()), ("role_id", 1.into())]),
            ))
            .unwrap()
            .unwrap();
        assert_eq!(id, EntityId::new(1));

        let rows = store.query(&sql::select_all("users")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::from("Ana"));
        assert_eq!(rows[0]["score"], Value::Real(1.5));
        assert_eq!(rows[0]["role_id"], Value::Integer(1));
    }

    #[test]
    fn constraint_violations_are_classified() {
        let store = setup();
        let duplicate = sql::insert("roles", &attrs(&[("id", 2.into()), ("name", "member".into())]));
        assert!(matches!(store.insert(&duplicate), Err(StoreError::Constraint(_))));

        let dangling = sql::insert("users", &attrs(&[("name", "Bo".into()), ("role_id", 9.into())]));
        assert!(matches!(store.insert(&dangling), Err(StoreError::Constraint(_))));
    }

    #[test]
    fn execute_reports_affected_rows() {
        let store = setup();
        let deleted = store
            .execute(&sql::delete("users", "id", 1.into()))
            .unwrap();
        assert_eq!(deleted, 0);
    }

    #[test]
    fn other_errors_pass_through() {
        let store = setup();
        let err = store.query(&sql::select_all("missing")).unwrap_err();
        assert!(matches!(err, StoreError::Rusqlite(_)));
    }
}
