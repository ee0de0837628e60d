//! Tracing utilities for statement and resource observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// roster_trace_query!(&sql_str, params.len());
/// ```
#[macro_export]
macro_rules! roster_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "roster.query");
    };
}

/// Emit a debug-level tracing event when the engine starts an operation.
///
/// ```ignore
/// roster_trace_resource!("find_all", descriptor.table());
/// ```
#[macro_export]
macro_rules! roster_trace_resource {
    ($op:literal, $table:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(op = $op, table = %$table, "roster.resource");
    };
}
