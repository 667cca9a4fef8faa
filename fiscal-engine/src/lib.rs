//! CFDI fiscal lifecycle engine
//!
//! # Overview
//!
//! Takes an invoice held by the host application through validation, CFDI
//! 4.0 XML construction, cadena original, CSD sealing and PAC stamping, and
//! tracks the resulting fiscal state. Cancellation, SAT status queries and
//! payment complements (Pagos 2.0) go through the same engine.
//!
//! ```text
//! fiscal-engine/src/
//! ├── core/          # configuration
//! ├── utils/         # logging
//! ├── validation/    # validator, ValidatedInvoice, totals
//! ├── cfdi/          # XML builders, cadena original, sealing
//! └── lifecycle/     # orchestrator, classifier, repository and credentials traits
//! ```

pub mod cfdi;
pub mod core;
pub mod lifecycle;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use core::EngineConfig;
pub use lifecycle::{
    CancelOutcome, CredentialsProvider, EngineError, EngineResult, FileCredentialsProvider,
    FiscalEngine, FiscalRepository, InMemoryRepository, LiveStatus, PreviewReport,
    RepositoryError, StampOutcome, StaticCredentials, StatusReport,
};
pub use utils::logger::init_logger_with_file;
pub use validation::{InvoiceDraft, Totals, ValidatedInvoice, Validator};
