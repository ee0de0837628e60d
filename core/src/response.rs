//! Error classifier: domain errors to HTTP status and body.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Body sent for every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Message of every 500 response.
pub const INTERNAL_MESSAGE: &str = "An internal error occurred.";

pub const NOT_FOUND: u16 = 404;
pub const NOT_MODIFIED: u16 = 304;
pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const INTERNAL_SERVER_ERROR: u16 = 500;

/// Maps an error to its status and body.
///
/// `Forbidden` shares 401 with `Unauthorized`. Internal details are logged
/// and never returned.
pub fn classify(error: &DomainError) -> (u16, ErrorBody) {
    let status = match error {
        DomainError::NotFound(_) => NOT_FOUND,
        DomainError::NotModified(_) => NOT_MODIFIED,
        DomainError::Malformed(_) => BAD_REQUEST,
        DomainError::Unauthorized(_) | DomainError::Forbidden(_) => UNAUTHORIZED,
        DomainError::Internal(_detail) => {
            #[cfg(feature = "tracing")]
            tracing::error!(detail = %_detail, "roster.internal");
            return (
                INTERNAL_SERVER_ERROR,
                ErrorBody {
                    message: INTERNAL_MESSAGE.to_owned(),
                },
            );
        }
    };

    (
        status,
        ErrorBody {
            message: error.message().to_owned(),
        },
    )
}
