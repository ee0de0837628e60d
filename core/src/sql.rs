//! Parameterized SQL fragments.
//!
//! Statements are assembled from chunks: raw keywords, quoted identifiers and
//! bound parameters. Rendering produces the statement text with positional
//! `?` placeholders alongside the parameter values in order, so no caller
//! supplied text is ever spliced into a statement.

use std::borrow::Cow;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::filters::Clause;
use crate::value::{Attributes, Value};

/// One piece of a SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SQLChunk {
    /// Keyword or punctuation, emitted verbatim
    Raw(Cow<'static, str>),
    /// Identifier, emitted double-quoted
    Ident(CompactString),
    /// `table.column`, each part double-quoted
    Qualified(CompactString, CompactString),
    /// Bound value, emitted as `?`
    Param(Value),
}

/// SQL fragment builder with flat chunk storage.
///
/// Uses `SmallVec<[SQLChunk; 8]>` for inline storage of typical fragments
/// without heap allocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SQL {
    pub chunks: SmallVec<[SQLChunk; 8]>,
}

impl SQL {
    /// Creates an empty SQL fragment
    #[inline]
    pub const fn empty() -> Self {
        Self {
            chunks: SmallVec::new_const(),
        }
    }

    /// Creates SQL with raw text (unquoted)
    #[inline]
    pub fn raw(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Raw(text.into())],
        }
    }

    /// Creates SQL with a quoted identifier
    #[inline]
    pub fn ident(name: impl Into<CompactString>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Ident(name.into())],
        }
    }

    /// Creates SQL with a table-qualified column
    #[inline]
    pub fn qualified(table: impl Into<CompactString>, column: impl Into<CompactString>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Qualified(table.into(), column.into())],
        }
    }

    /// Creates SQL with a single parameter value
    #[inline]
    pub fn param(value: impl Into<Value>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Param(value.into())],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Appends another fragment
    #[inline]
    pub fn append(mut self, other: SQL) -> Self {
        self.append_mut(other);
        self
    }

    #[inline]
    pub fn append_mut(&mut self, other: SQL) {
        self.chunks.extend(other.chunks);
    }

    /// Appends raw text
    #[inline]
    pub fn push(mut self, text: impl Into<Cow<'static, str>>) -> Self {
        self.chunks.push(SQLChunk::Raw(text.into()));
        self
    }

    /// Joins fragments with a raw separator
    pub fn join(parts: impl IntoIterator<Item = SQL>, separator: &'static str) -> Self {
        let mut sql = SQL::empty();
        for (idx, part) in parts.into_iter().enumerate() {
            if idx > 0 {
                sql.chunks.push(SQLChunk::Raw(Cow::Borrowed(separator)));
            }
            sql.append_mut(part);
        }
        sql
    }

    /// Wraps the fragment in parentheses
    pub fn parens(self) -> Self {
        SQL::raw("(").append(self).push(")")
    }

    /// Renders the statement text with positional placeholders.
    pub fn sql(&self) -> String {
        let mut out = String::with_capacity(self.chunks.len() * 8);
        for (idx, chunk) in self.chunks.iter().enumerate() {
            if idx > 0 && needs_space(&self.chunks[idx - 1], chunk) {
                out.push(' ');
            }
            match chunk {
                SQLChunk::Raw(text) => out.push_str(text),
                SQLChunk::Ident(name) => write_ident(&mut out, name),
                SQLChunk::Qualified(table, column) => {
                    write_ident(&mut out, table);
                    out.push('.');
                    write_ident(&mut out, column);
                }
                SQLChunk::Param(_) => out.push('?'),
            }
        }
        out
    }

    /// Bound parameter values in placeholder order.
    pub fn params(&self) -> impl Iterator<Item = &Value> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            SQLChunk::Param(value) => Some(value),
            _ => None,
        })
    }
}

impl std::fmt::Display for SQL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql())
    }
}

fn needs_space(prev: &SQLChunk, next: &SQLChunk) -> bool {
    let ends_open = matches!(prev, SQLChunk::Raw(t) if t.ends_with('('));
    let starts_tight = matches!(
        next,
        SQLChunk::Raw(t) if t.starts_with(')') || t.starts_with(',') || t.starts_with('.')
    );
    !(ends_open || starts_tight)
}

fn write_ident(out: &mut String, name: &str) {
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

// =============================================================================
// Statement helpers
// =============================================================================

/// `"col" <op> ?` joined with `AND`, prefixed by `WHERE` when non-empty.
pub fn where_clauses<'c>(table: &str, clauses: impl IntoIterator<Item = &'c Clause>) -> SQL {
    let conditions: Vec<SQL> = clauses
        .into_iter()
        .map(|clause| {
            SQL::qualified(table, clause.key.as_str())
                .push(clause.comparator.as_sql())
                .append(SQL::param(clause.value.clone()))
        })
        .collect();

    if conditions.is_empty() {
        return SQL::empty();
    }
    SQL::raw("WHERE").append(SQL::join(conditions, "AND"))
}

/// `"table"."column" IN (?, ?, ...)`
pub fn in_list(table: &str, column: &str, values: impl IntoIterator<Item = Value>) -> SQL {
    let params = SQL::join(values.into_iter().map(SQL::param), ",");
    SQL::qualified(table, column)
        .push("IN")
        .append(params.parens())
}

/// `SELECT "table".* FROM "table"`
pub fn select_all(table: &str) -> SQL {
    SQL::raw("SELECT")
        .append(SQL::ident(table))
        .push(".*")
        .push("FROM")
        .append(SQL::ident(table))
}

/// `INSERT INTO "table" ("a", "b") VALUES (?, ?)` or `DEFAULT VALUES` when empty.
pub fn insert(table: &str, attrs: &Attributes) -> SQL {
    let sql = SQL::raw("INSERT INTO").append(SQL::ident(table));
    if attrs.is_empty() {
        return sql.push("DEFAULT VALUES");
    }

    let columns = SQL::join(attrs.keys().map(|k| SQL::ident(k.as_str())), ",");
    let values = SQL::join(attrs.values().cloned().map(SQL::param), ",");
    sql.append(columns.parens())
        .push("VALUES")
        .append(values.parens())
}

/// `UPDATE "table" SET "a" = ?, "b" = ? WHERE "id" = ?`
pub fn update(table: &str, attrs: &Attributes, id_column: &str, id: Value) -> SQL {
    let assignments = SQL::join(
        attrs.iter().map(|(column, value)| {
            SQL::ident(column.as_str())
                .push("=")
                .append(SQL::param(value.clone()))
        }),
        ",",
    );
    SQL::raw("UPDATE")
        .append(SQL::ident(table))
        .push("SET")
        .append(assignments)
        .push("WHERE")
        .append(SQL::ident(id_column))
        .push("=")
        .append(SQL::param(id))
}

/// `DELETE FROM "table" WHERE "id" = ?`
pub fn delete(table: &str, id_column: &str, id: Value) -> SQL {
    SQL::raw("DELETE FROM")
        .append(SQL::ident(table))
        .push("WHERE")
        .append(SQL::ident(id_column))
        .push("=")
        .append(SQL::param(id))
}

/// `ORDER BY "table"."column" ASC`
pub fn order_by(table: &str, column: &str) -> SQL {
    SQL::raw("ORDER BY")
        .append(SQL::qualified(table, column))
        .push("ASC")
}

/// `LIMIT n`
pub fn limit(n: usize) -> SQL {
    SQL::raw(format!("LIMIT {n}"))
}
