//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category, determined by the leading digit of the error code.
///
/// These are the stable error kinds reported to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or inconsistent invoice data (1xxx)
    Validation,
    /// Bad passphrase, mismatched or expired CSD (2xxx)
    Credential,
    /// Malformed key material or XML (3xxx)
    Signing,
    /// The PAC/SAT refused the request (4xxx)
    PacRejected,
    /// Network failure or timeout talking to the PAC (5xxx)
    PacUnavailable,
    /// Operation attempted from an incompatible fiscal state (6xxx)
    StateConflict,
    /// Fiscal act happened but the local save failed (7xxx)
    Persistence,
    /// Anything else (9xxx)
    Internal,
}

/// What the caller can do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Retrying the same request may succeed
    AsIs,
    /// Retry only after correcting data or credentials
    AfterFix,
    /// Retrying will not help; manual action is required
    Never,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            1000..2000 => Self::Validation,
            2000..3000 => Self::Credential,
            3000..4000 => Self::Signing,
            4000..5000 => Self::PacRejected,
            5000..6000 => Self::PacUnavailable,
            6000..7000 => Self::StateConflict,
            7000..8000 => Self::Persistence,
            _ => Self::Internal,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Credential => "credential",
            Self::Signing => "signing",
            Self::PacRejected => "pac_rejected",
            Self::PacUnavailable => "pac_unavailable",
            Self::StateConflict => "state_conflict",
            Self::Persistence => "persistence",
            Self::Internal => "internal",
        }
    }

    /// Default retry policy for the category
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::PacUnavailable => RetryPolicy::AsIs,
            Self::Validation | Self::Credential | Self::PacRejected => RetryPolicy::AfterFix,
            Self::Signing | Self::StateConflict | Self::Persistence | Self::Internal => {
                RetryPolicy::Never
            }
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
