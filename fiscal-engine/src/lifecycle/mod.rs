//! Fiscal lifecycle: orchestration and its collaborators

pub mod classifier;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod repository;

pub use classifier::{classify, classify_pac, classify_raw};
pub use credentials::{
    CredentialsError, CredentialsProvider, FileCredentialsProvider, StaticCredentials,
};
pub use engine::FiscalEngine;
pub use error::{EngineError, EngineResult, RepositoryError};
pub use outcome::{CancelOutcome, LiveStatus, PreviewReport, StampOutcome, StatusReport};
pub use repository::{FiscalRepository, InMemoryRepository, RepositoryResult};
