//! Error types for the Firestore REST client

use thiserror::Error;

/// Errors that can occur when talking to Firestore
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be parsed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// The addressed document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A write precondition did not hold (document changed since it was read)
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API returned any other error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// A typed value could not be converted
    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue {
        /// Field path of the offending value
        field: String,
        /// What went wrong
        reason: String,
    },
}

impl FirestoreError {
    /// Whether the error means the write lost a race against another writer
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::PreconditionFailed(_))
    }
}
