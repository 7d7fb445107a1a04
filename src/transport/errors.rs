//! Transport error types

use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures reported by the query transport or the part store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The response outgrew the in-memory buffer while streaming was not allowed
    #[error("result exceeds the {limit_bytes} byte buffer limit")]
    ResultTooLarge { limit_bytes: u64 },

    /// The query was cancelled before it completed
    #[error("query cancelled")]
    Cancelled,

    /// The stream directory does not exist
    #[error("stream directory not found: {0}")]
    DirectoryNotFound(String),

    /// A part file exists but holds no record
    #[error("invalid part: {0}")]
    InvalidPart(String),

    #[error("I/O error: {0}")]
    IoError(String),

    /// The query service rejected or failed the query
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl TransportError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::ResultTooLarge { .. } => "DOCQ_RESULT_TOO_LARGE",
            TransportError::Cancelled => "DOCQ_CANCELLED",
            TransportError::DirectoryNotFound(_) => "DOCQ_TRANSPORT_DIRECTORY_NOT_FOUND",
            TransportError::InvalidPart(_) => "DOCQ_TRANSPORT_INVALID_PART",
            TransportError::IoError(_) => "DOCQ_TRANSPORT_IO_ERROR",
            TransportError::QueryFailed(_) => "DOCQ_TRANSPORT_QUERY_FAILED",
        }
    }

    /// Returns true if this is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::IoError(e.to_string())
    }
}
