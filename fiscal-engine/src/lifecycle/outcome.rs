//! Operation results returned to the host

use chrono::{DateTime, NaiveDateTime, Utc};
use pac_client::SatStatus;
use serde::{Deserialize, Serialize};
use shared::ClassifiedError;
use shared::models::{ComplementFigures, FiscalState, StampingResult};

use crate::validation::Totals;

/// A stamp that happened at the PAC
///
/// `warning` is set when the local save failed afterwards: the CFDI is valid
/// at SAT and `result` must be handed to `reconcile`, not stamped again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampOutcome {
    pub uuid: String,
    pub stamped_at: NaiveDateTime,
    pub result: StampingResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figures: Option<ComplementFigures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<ClassifiedError>,
}

impl StampOutcome {
    pub fn needs_reconcile(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOutcome {
    pub acknowledgement: String,
    pub cancelled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<ClassifiedError>,
}

/// Dry run: nothing is signed, sent or persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewReport {
    pub messages: Vec<String>,
    /// `None` when the line amounts exceed the representable range
    pub totals: Option<Totals>,
    /// Unsigned XML; only built when there are no messages
    pub xml: Option<String>,
}

impl PreviewReport {
    pub fn is_ready(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub invoice_id: String,
    pub local_state: FiscalState,
    pub uuid: Option<String>,
    /// `None` when the invoice was never stamped
    pub live: Option<LiveStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveStatus {
    Reported(SatStatus),
    Unavailable(ClassifiedError),
}
