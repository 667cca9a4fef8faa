//! Fiscal lifecycle records (timbrado, cancelación, último error)

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClassifiedError, ErrorCategory, ErrorCode};

/// Fiscal state of an invoice
///
/// `Draft -> Stamped -> Cancelled`; `Error` is reachable from `Draft` and
/// goes back to `Draft` on retry. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalState {
    #[default]
    Draft,
    Stamped,
    Cancelled,
    Error,
}

impl FiscalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Stamped => "stamped",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FiscalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SAT environment a CSD and an invoice belong to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" | "pruebas" | "sandbox" => Ok(Self::Test),
            "production" | "produccion" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Outcome of a successful PAC stamp. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampingResult {
    /// Folio fiscal assigned by SAT
    pub uuid: String,
    /// Stamped XML with the TimbreFiscalDigital complement
    pub stamped_xml: String,
    /// Sealed XML as submitted to the PAC
    pub unsigned_xml: String,
    /// Cadena original that was signed
    pub cadena_original: String,
    /// Emitter seal (Sello)
    pub seal: String,
    /// Emitter CSD serial (NoCertificado)
    pub certificate_number: String,
    /// PAC/SAT seal (SelloSAT)
    pub pac_seal: String,
    /// SAT certificate serial (NoCertificadoSAT)
    pub pac_certificate_number: String,
    /// FechaTimbrado as reported by the PAC
    pub stamped_at: NaiveDateTime,
}

/// SAT cancellation reason (c_MotivoCancelacion)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CancellationReason {
    /// 01: issued with errors, with a substitute CFDI
    ErrorsWithRelation,
    /// 02: issued with errors, without relation
    ErrorsWithoutRelation,
    /// 03: the operation did not take place
    OperationNotCarriedOut,
    /// 04: nominative operation included in a global invoice
    IncludedInGlobalInvoice,
}

impl CancellationReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ErrorsWithRelation => "01",
            Self::ErrorsWithoutRelation => "02",
            Self::OperationNotCarriedOut => "03",
            Self::IncludedInGlobalInvoice => "04",
        }
    }

    /// Reason 01 must name the CFDI that replaces the cancelled one
    pub fn requires_substitute(&self) -> bool {
        matches!(self, Self::ErrorsWithRelation)
    }
}

impl FromStr for CancellationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "01" => Ok(Self::ErrorsWithRelation),
            "02" => Ok(Self::ErrorsWithoutRelation),
            "03" => Ok(Self::OperationNotCarriedOut),
            "04" => Ok(Self::IncludedInGlobalInvoice),
            other => Err(format!("unknown cancellation reason: {other}")),
        }
    }
}

impl TryFrom<String> for CancellationReason {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CancellationReason> for String {
    fn from(reason: CancellationReason) -> Self {
        reason.code().to_string()
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Audit record of an acknowledged cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub reason: CancellationReason,
    pub substitute_uuid: Option<String>,
    /// Acknowledgement returned by the PAC (acuse)
    pub acknowledgement: String,
    /// Cancellation status reported by the PAC
    pub status: String,
    pub cancelled_at: DateTime<Utc>,
}

/// Last classified failure persisted on a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub title: String,
    pub detail: String,
    pub raw_code: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl LastError {
    pub fn from_classified(error: &ClassifiedError, occurred_at: DateTime<Utc>) -> Self {
        Self {
            code: error.code,
            category: error.category,
            title: error.title.clone(),
            detail: error.detail.clone(),
            raw_code: error.raw_code.clone(),
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialize() {
        assert_eq!(serde_json::to_string(&FiscalState::Stamped).unwrap(), "\"stamped\"");
        assert_eq!(FiscalState::default(), FiscalState::Draft);
    }

    #[test]
    fn test_cancellation_reason_codes() {
        let reason: CancellationReason = "01".parse().unwrap();
        assert!(reason.requires_substitute());
        assert!(!CancellationReason::ErrorsWithoutRelation.requires_substitute());
        assert!("05".parse::<CancellationReason>().is_err());
        assert_eq!(
            serde_json::to_string(&CancellationReason::OperationNotCarriedOut).unwrap(),
            "\"03\""
        );
        let parsed: CancellationReason = serde_json::from_str("\"04\"").unwrap();
        assert_eq!(parsed, CancellationReason::IncludedInGlobalInvoice);
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("Production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("pruebas".parse::<Environment>(), Ok(Environment::Test));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_last_error_from_classified() {
        let err = ClassifiedError::new(ErrorCode::InvalidSeal, "CFDI40102").with_raw_code("CFDI40102");
        let last = LastError::from_classified(&err, Utc::now());
        assert_eq!(last.category, ErrorCategory::PacRejected);
        assert_eq!(last.raw_code.as_deref(), Some("CFDI40102"));
    }
}
