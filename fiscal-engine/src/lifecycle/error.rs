use csd_cert::CertError;
use pac_client::PacError;
use rust_decimal::Decimal;
use shared::ClassifiedError;
use shared::models::{Environment, FiscalState};
use shared::xml::XmlError;
use thiserror::Error;

use crate::cfdi::SealError;

/// Storage collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Cannot {operation} invoice {invoice_id} in state {state}")]
    StateConflict {
        invoice_id: String,
        state: FiscalState,
        operation: &'static str,
    },

    #[error("Payment {payment_id} already has complement {uuid}")]
    ComplementAlreadyIssued { payment_id: String, uuid: String },

    #[error("Origin invoice {invoice_id} is {state}, not stamped")]
    OriginNotStamped {
        invoice_id: String,
        state: FiscalState,
    },

    #[error("Invoice {0} does not use deferred payment (PPD)")]
    NotDeferredPayment(String),

    #[error("Payment of {amount} exceeds the outstanding balance of {balance}")]
    PaymentExceedsBalance { amount: Decimal, balance: Decimal },

    #[error("No active CSD for {rfc} in {environment}")]
    CredentialsUnavailable {
        rfc: String,
        environment: Environment,
    },

    #[error("CSD {certificate_number} does not belong to {expected}")]
    CertificateRfcMismatch {
        certificate_number: String,
        expected: String,
    },

    #[error(transparent)]
    Certificate(#[from] CertError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error(transparent)]
    Pac(#[from] PacError),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn state_conflict(
        invoice_id: impl Into<String>,
        state: FiscalState,
        operation: &'static str,
    ) -> Self {
        Self::StateConflict {
            invoice_id: invoice_id.into(),
            state,
            operation,
        }
    }

    /// Map onto the stable fiscal taxonomy
    pub fn classify(&self) -> ClassifiedError {
        super::classifier::classify(self)
    }
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { kind, id } => EngineError::NotFound { kind, id },
            RepositoryError::Storage(message) => EngineError::Persistence(message),
        }
    }
}

impl From<SealError> for EngineError {
    fn from(err: SealError) -> Self {
        match err {
            SealError::Cert(e) => EngineError::Certificate(e),
            SealError::Xml(e) => EngineError::Xml(e),
        }
    }
}

impl From<EngineError> for ClassifiedError {
    fn from(err: EngineError) -> Self {
        err.classify()
    }
}
