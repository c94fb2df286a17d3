//! Errors raised by the AWS admin clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    /// An SDK call failed.
    #[error("{operation} failed: {message}")]
    Sdk {
        operation: &'static str,
        message: String,
    },

    /// Create was refused because the resource exists.
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: &'static str, name: String },

    /// The service response lacked a field we depend on.
    #[error("Missing {0} in response")]
    MissingField(&'static str),

    /// A definition or pattern was not valid JSON.
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render an SDK error with its full source chain.
pub fn sdk_error<E>(operation: &'static str, err: E) -> AdminError
where
    E: std::error::Error + 'static,
{
    AdminError::Sdk {
        operation,
        message: aws_sdk_sfn::error::DisplayErrorContext(&err).to_string(),
    }
}
