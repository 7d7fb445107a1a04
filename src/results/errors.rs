//! Result state error types

use serde::Serialize;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type for result state transitions
pub type ResultsResult<T> = Result<T, ResultError>;

/// Errors recorded in, or raised by, the result state machine
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResultError {
    /// Reading a page or sending a query failed; retry by re-invoking
    #[error("transport failure: {message}")]
    TransportFailure { message: String },

    /// The buffered result is too large to hold in memory
    #[error(
        "result exceeds the {limit_bytes} byte buffer limit; enable streaming to page through large results"
    )]
    ResultTooLarge { limit_bytes: u64 },

    /// A transition was requested whose precondition does not hold
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl ResultError {
    /// Create a transport failure error
    pub fn transport_failure(message: impl Into<String>) -> Self {
        ResultError::TransportFailure {
            message: message.into(),
        }
    }

    /// Create an invalid transition error
    pub fn invalid_transition(from: &'static str, to: &'static str) -> Self {
        ResultError::InvalidTransition { from, to }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            ResultError::TransportFailure { .. } => "DOCQ_TRANSPORT_FAILURE",
            ResultError::ResultTooLarge { .. } => "DOCQ_RESULT_TOO_LARGE",
            ResultError::InvalidTransition { .. } => "DOCQ_INVALID_TRANSITION",
        }
    }
}

impl From<TransportError> for ResultError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::ResultTooLarge { limit_bytes } => {
                ResultError::ResultTooLarge { limit_bytes }
            }
            other => ResultError::transport_failure(other.to_string()),
        }
    }
}
