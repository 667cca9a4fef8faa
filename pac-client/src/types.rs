//! Requests and results exchanged with a PAC

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::CancellationReason;

use crate::error::{PacError, PacResult};

/// A successful stamp (timbre fiscal digital)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampReceipt {
    pub uuid: String,
    /// XML including the TimbreFiscalDigital complement
    pub stamped_xml: String,
    /// SelloSAT
    pub pac_seal: String,
    /// NoCertificadoSAT
    pub pac_certificate_number: String,
    /// FechaTimbrado
    pub stamped_at: NaiveDateTime,
}

/// Cancellation of a stamped CFDI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub uuid: String,
    pub emitter_rfc: String,
    pub reason: CancellationReason,
    /// Required for reason 01
    pub substitute_uuid: Option<String>,
}

impl CancelRequest {
    /// Build a validated request
    pub fn new(
        uuid: impl Into<String>,
        emitter_rfc: impl Into<String>,
        reason: CancellationReason,
        substitute_uuid: Option<String>,
    ) -> PacResult<Self> {
        let request = Self {
            uuid: uuid.into(),
            emitter_rfc: emitter_rfc.into(),
            reason,
            substitute_uuid: substitute_uuid.filter(|s| !s.trim().is_empty()),
        };
        request.validate()?;
        Ok(request)
    }

    /// Local checks done before any network call
    pub fn validate(&self) -> PacResult<()> {
        if self.uuid.trim().is_empty() {
            return Err(PacError::InvalidRequest("UUID is required".into()));
        }
        if self.emitter_rfc.trim().is_empty() {
            return Err(PacError::InvalidRequest("emitter RFC is required".into()));
        }
        match (&self.substitute_uuid, self.reason.requires_substitute()) {
            (None, true) => Err(PacError::SubstituteUuidRequired),
            (Some(substitute), true) => {
                uuid::Uuid::parse_str(substitute.trim()).map_err(|_| {
                    PacError::InvalidRequest(format!("invalid substitute UUID: {}", substitute))
                })?;
                if substitute.trim().eq_ignore_ascii_case(self.uuid.trim()) {
                    return Err(PacError::InvalidRequest(
                        "a CFDI cannot substitute itself".into(),
                    ));
                }
                Ok(())
            }
            (Some(_), false) => Err(PacError::InvalidRequest(format!(
                "substitute UUID is only allowed with reason 01, got {}",
                self.reason
            ))),
            (None, false) => Ok(()),
        }
    }
}

/// Acknowledged cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReceipt {
    /// Acuse de cancelación
    pub acknowledgement: String,
    /// Status reported by the PAC (e.g. "Cancelado", "En proceso")
    pub status: String,
    pub cancelled_at: DateTime<Utc>,
}

/// Live SAT status lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusQuery {
    pub uuid: String,
    pub emitter_rfc: String,
    pub receiver_rfc: String,
    pub total: Decimal,
}

/// State of a CFDI at SAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SatDocumentState {
    #[serde(rename = "Vigente")]
    Active,
    #[serde(rename = "Cancelado")]
    Cancelled,
    #[serde(rename = "No Encontrado")]
    NotFound,
}

/// Result of a status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatStatus {
    pub state: SatDocumentState,
    /// EsCancelable (e.g. "Cancelable sin aceptación")
    pub cancellable: Option<String>,
    /// EstatusCancelacion
    pub cancellation_state: Option<String>,
}
