//! JSON bodies of the PAC HTTP contract
//!
//! | Method | Path              | Request              | Response              |
//! |--------|-------------------|----------------------|-----------------------|
//! | POST   | `/cfdi40/stamp`   | [`StampBody`]        | [`StampedBody`]       |
//! | POST   | `/cfdi40/cancel`  | [`CancelBody`]       | [`CancelledBody`]     |
//! | GET    | `/cfdi40/status`  | [`StatusParams`]     | [`StatusBody`]        |
//!
//! Failures answer with a non-2xx status and an [`ErrorBody`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STAMP_PATH: &str = "/cfdi40/stamp";
pub const CANCEL_PATH: &str = "/cfdi40/cancel";
pub const STATUS_PATH: &str = "/cfdi40/status";

/// PAC code for a document stamped before
pub const ALREADY_STAMPED_CODE: &str = "307";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampBody {
    pub xml: String,
}

/// Stamp response. Only `xml` is mandatory; the rest can be read from the
/// TimbreFiscalDigital inside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StampedBody {
    pub xml: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub sat_seal: Option<String>,
    #[serde(default)]
    pub sat_certificate_number: Option<String>,
    #[serde(default)]
    pub stamped_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBody {
    pub uuid: String,
    pub emitter_rfc: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitute_uuid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelledBody {
    pub acknowledgement: String,
    pub status: String,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusParams {
    pub uuid: String,
    pub emitter_rfc: String,
    pub receiver_rfc: String,
    pub total: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBody {
    pub state: String,
    #[serde(default)]
    pub cancellable: Option<String>,
    #[serde(default)]
    pub cancellation_state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// UUID of the earlier stamp, for code 307
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}
