//! Fiscal error taxonomy
//!
//! - [`ErrorCode`]: numbered codes for every failure the engine reports
//! - [`ErrorCategory`]: the stable kind derived from the code range
//! - [`ClassifiedError`]: code + title + raw detail + remediation
//!
//! # Example
//!
//! ```
//! use shared::error::{ClassifiedError, ErrorCategory, ErrorCode};
//!
//! let err = ClassifiedError::new(ErrorCode::InvalidSeal, "CFDI40102 - Sello inválido")
//!     .with_raw_code("CFDI40102");
//! assert_eq!(err.category, ErrorCategory::PacRejected);
//! ```

mod category;
mod codes;
mod types;

pub use category::{ErrorCategory, RetryPolicy};
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::ClassifiedError;
