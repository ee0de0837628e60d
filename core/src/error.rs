use compact_str::CompactString;
use thiserror::Error;

/// Outcome of a resource operation that did not produce a value.
///
/// Raised by the engine or the guard, carried unchanged through controller
/// code and consumed once by [`classify`](crate::response::classify).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// The resource existed (or was attempted) but nothing was written
    #[error("{0}")]
    NotModified(String),

    /// The request itself is invalid (unknown relation, bad body, bad id)
    #[error("{0}")]
    Malformed(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// The caller may not perform this write or access this route
    #[error("{0}")]
    Forbidden(String),

    /// Anything else; the message never reaches the client
    #[error("{0}")]
    Internal(String),
}

/// Discriminant of [`DomainError`], handy for assertions and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotModified,
    Malformed,
    Unauthorized,
    Forbidden,
    Internal,
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn not_modified(message: impl Into<String>) -> Self {
        Self::NotModified(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotModified(_) => ErrorKind::NotModified,
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::NotModified(m)
            | Self::Malformed(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Error reported by a [`Store`](crate::store::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness, foreign-key or check constraint rejected the write
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Error executing a statement
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// A row could not be mapped into attributes
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The connection is unusable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint(_detail) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(detail = %_detail, "roster.constraint");
                DomainError::not_modified("Resource was not modified.")
            }
            other => DomainError::internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        #[cfg(feature = "tracing")]
        tracing::error!(error = %err, "roster.serialize");
        DomainError::internal(err.to_string())
    }
}

/// Descriptor misconfiguration detected while building a [`Schema`](crate::Schema).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("model `{0}` declares both fillable and guarded attributes")]
    ConflictingPolicy(CompactString),

    #[error("model `{model}` already declares a relation named `{relation}`")]
    DuplicateRelation {
        model: CompactString,
        relation: CompactString,
    },

    #[error("model id {0} does not belong to this schema")]
    UnknownModel(usize),
}

/// Result type for resource operations
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::classify;

    #[test]
    fn serialization_failures_are_internal() {
        let err: DomainError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let (status, body) = classify(&err);
        assert_eq!(status, 500);
        assert_eq!(body.message, "An internal error occurred.");
    }

    #[test]
    fn constraint_violations_are_not_modified() {
        let err = DomainError::from(StoreError::Constraint("UNIQUE".into()));
        assert_eq!(err.kind(), ErrorKind::NotModified);
    }
}
