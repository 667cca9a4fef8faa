//! Classified error reported to the host application

use super::category::{ErrorCategory, RetryPolicy};
use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure mapped onto the stable fiscal error taxonomy.
///
/// Carries everything a caller needs to render the failure and decide on a
/// retry:
/// - `code` / `category`: stable kind
/// - `title`: short user-facing text
/// - `detail`: raw underlying text for support diagnosis
/// - `remediation`: optional steps for the user
/// - `raw_code`: the PAC/SAT code when the error came from the PAC
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{title}: {detail}")]
pub struct ClassifiedError {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub title: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_code: Option<String>,
}

impl ClassifiedError {
    /// Create an error with the default title for the code
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            category: code.category(),
            title: code.message().to_string(),
            detail: detail.into(),
            remediation: Vec::new(),
            raw_code: None,
        }
    }

    /// Override the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add a remediation step
    pub fn with_remediation(mut self, step: impl Into<String>) -> Self {
        self.remediation.push(step.into());
        self
    }

    /// Attach the raw PAC/SAT code
    pub fn with_raw_code(mut self, raw_code: impl Into<String>) -> Self {
        self.raw_code = Some(raw_code.into());
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.category.retry_policy()
    }

    /// Whether the same request can be retried unchanged
    pub fn is_retriable(&self) -> bool {
        self.retry_policy() == RetryPolicy::AsIs
    }
}
