//! SQLite PRAGMA statements applied when a store is opened.
//!
//! [SQLite PRAGMA Documentation](https://sqlite.org/pragma.html)

use roster_core::SQL;

/// Journal modes for SQLite databases
///
/// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_journal_mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// Connection-level PRAGMA settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pragma {
    /// Enforce foreign key constraints (off by default in SQLite)
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_foreign_keys)
    ForeignKeys(bool),
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_journal_mode)
    JournalMode(JournalMode),
    /// Milliseconds to wait on a locked database
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_busy_timeout)
    BusyTimeout(u32),
}

impl Pragma {
    pub fn to_sql(self) -> SQL {
        match self {
            Pragma::ForeignKeys(on) => {
                SQL::raw("PRAGMA foreign_keys =").push(if on { "ON" } else { "OFF" })
            }
            Pragma::JournalMode(mode) => SQL::raw("PRAGMA journal_mode =").push(mode.as_str()),
            Pragma::BusyTimeout(ms) => SQL::raw(format!("PRAGMA busy_timeout = {ms}")),
        }
    }
}
