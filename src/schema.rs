//! SQLite tables backing the models, and the fixed role rows.

use roster_core::{SQL, StoreError};
use roster_sqlite::SqliteStore;

use crate::models::Role;

/// `CREATE TABLE` statements in dependency order.
pub const TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS "roles" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL UNIQUE,
    "display_name" TEXT NOT NULL DEFAULT '',
    "description" TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS "users" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "email" TEXT UNIQUE,
    "password" TEXT NOT NULL,
    "first_name" TEXT NOT NULL DEFAULT '',
    "last_name" TEXT NOT NULL DEFAULT '',
    "pid" TEXT UNIQUE,
    "house" TEXT NOT NULL DEFAULT 'none' CHECK ("house" IN ('red', 'green', 'blue', 'none')),
    "is_admin" INTEGER NOT NULL DEFAULT 0,
    "valid" INTEGER NOT NULL DEFAULT 1,
    "role_id" INTEGER NOT NULL DEFAULT 1 REFERENCES "roles" ("id")
);

CREATE TABLE IF NOT EXISTS "event_types" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "name" TEXT NOT NULL UNIQUE,
    "display_name" TEXT NOT NULL DEFAULT '',
    "description" TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS "events" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "summary" TEXT NOT NULL DEFAULT '',
    "description" TEXT NOT NULL DEFAULT '',
    "points" INTEGER NOT NULL DEFAULT 0,
    "location" TEXT NOT NULL DEFAULT '',
    "start" TEXT NOT NULL,
    "end" TEXT NOT NULL,
    "created_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    "updated_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    "type_id" INTEGER NOT NULL REFERENCES "event_types" ("id"),
    "officer_id" INTEGER REFERENCES "users" ("id") ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS "attendance_records" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "user_id" INTEGER NOT NULL REFERENCES "users" ("id") ON DELETE CASCADE,
    "event_id" INTEGER NOT NULL REFERENCES "events" ("id") ON DELETE CASCADE,
    "points_earned" REAL NOT NULL DEFAULT 0 CHECK ("points_earned" >= 0),
    UNIQUE ("user_id", "event_id")
);

CREATE TABLE IF NOT EXISTS "announcements" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "summary" TEXT NOT NULL,
    "description" TEXT NOT NULL DEFAULT '',
    "created_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    "updated_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Creates missing tables and seeds the role rows.
pub fn install(store: &SqliteStore) -> Result<(), StoreError> {
    store.execute_batch(TABLES)?;
    for role in Role::ALL {
        let seed = SQL::raw("INSERT OR IGNORE INTO")
            .append(SQL::ident("roles"))
            .push("(\"id\", \"name\", \"display_name\", \"description\")")
            .push("VALUES (")
            .append(SQL::param(role.id()))
            .push(",")
            .append(SQL::param(role.name()))
            .push(",")
            .append(SQL::param(role.display_name()))
            .push(",")
            .append(SQL::param(role.description()))
            .push(")");
        roster_core::Store::execute(store, &seed)?;
    }
    Ok(())
}
