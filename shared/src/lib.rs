//! Shared types for the CFDI fiscal engine
//!
//! Common types used across the workspace crates: fiscal records, the static
//! SAT catalog, error codes, decimal money helpers and a minimal XML tree.

pub mod catalog;
pub mod error;
pub mod models;
pub mod money;
pub mod xml;

// Re-exports
pub use catalog::Catalog;
pub use error::{ClassifiedError, ErrorCategory, ErrorCode, RetryPolicy};
pub use serde::{Deserialize, Serialize};
pub use xml::{XmlError, XmlNode};
