//! PAC client error types

use thiserror::Error;

/// PAC error type
///
/// `Unreachable` is the only variant that is safe to retry unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacError {
    /// Network failure, timeout or gateway error
    #[error("PAC unreachable: {0}")]
    Unreachable(String),

    /// The PAC/SAT refused the request
    #[error("PAC rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The document had been stamped before
    #[error("Document already stamped: {message}")]
    AlreadyStamped {
        message: String,
        uuid: Option<String>,
    },

    /// PAC account credentials were refused
    #[error("PAC authentication failed: {0}")]
    Unauthorized(String),

    /// Cancellation reason 01 without the substitute UUID
    #[error("Cancellation reason 01 requires a substitute UUID")]
    SubstituteUuidRequired,

    /// Request rejected locally before any network call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The PAC answered with something that could not be understood
    #[error("Invalid PAC response: {0}")]
    InvalidResponse(String),
}

impl PacError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, PacError::Unreachable(_))
    }

    /// Raw PAC/SAT code, when the PAC supplied one
    pub fn raw_code(&self) -> Option<&str> {
        match self {
            PacError::Rejected { code, .. } => Some(code),
            PacError::AlreadyStamped { .. } => Some("307"),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PacError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PacError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            PacError::InvalidRequest(err.to_string())
        } else {
            // timeouts, connect and body errors
            PacError::Unreachable(err.to_string())
        }
    }
}

/// Result type for PAC operations
pub type PacResult<T> = Result<T, PacError>;
