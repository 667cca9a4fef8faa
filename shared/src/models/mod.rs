//! Fiscal data models
//!
//! Shared between the engine and its hosts. Every record is serde-ready so
//! hosts can keep them as JSON. Monetary values are `Decimal`.

pub mod fiscal;
pub mod invoice;
pub mod line_item;
pub mod party;
pub mod payment;

// Re-exports
pub use fiscal::*;
pub use invoice::*;
pub use line_item::*;
pub use party::*;
pub use payment::*;
