//! HTTP implementation of [`PacClient`]

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::xml::XmlNode;

use crate::client::PacClient;
use crate::config::PacConfig;
use crate::error::{PacError, PacResult};
use crate::types::{
    CancelReceipt, CancelRequest, SatDocumentState, SatStatus, StampReceipt, StatusQuery,
};
use crate::wire::{
    ALREADY_STAMPED_CODE, CANCEL_PATH, CancelBody, CancelledBody, ErrorBody, STAMP_PATH,
    STATUS_PATH, StampBody, StampedBody, StatusBody, StatusParams,
};

/// FechaTimbrado format
const STAMP_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// PAC client speaking the JSON contract in [`crate::wire`]
#[derive(Debug, Clone)]
pub struct HttpPacClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPacClient {
    /// Create a new client from configuration
    pub fn new(config: &PacConfig) -> PacResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout_duration())
            .build()
            .map_err(|e| PacError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> PacResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| PacError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PacClient for HttpPacClient {
    async fn stamp(&self, signed_xml: &str) -> PacResult<StampReceipt> {
        tracing::debug!(bytes = signed_xml.len(), "Submitting CFDI for stamping");

        let body = StampBody {
            xml: signed_xml.to_string(),
        };
        let request = self.authorized(self.client.post(self.url(STAMP_PATH)).json(&body));
        let response = request.send().await?;
        let stamped: StampedBody = Self::handle_response(response).await?;

        let receipt = receipt_from_body(stamped)?;
        tracing::info!(uuid = %receipt.uuid, "CFDI stamped");
        Ok(receipt)
    }

    async fn cancel(&self, request: &CancelRequest) -> PacResult<CancelReceipt> {
        request.validate()?;
        tracing::debug!(uuid = %request.uuid, reason = %request.reason, "Requesting cancellation");

        let body = CancelBody {
            uuid: request.uuid.clone(),
            emitter_rfc: request.emitter_rfc.clone(),
            reason: request.reason.code().to_string(),
            substitute_uuid: request.substitute_uuid.clone(),
        };
        let http_request = self.authorized(self.client.post(self.url(CANCEL_PATH)).json(&body));
        let response = http_request.send().await?;
        let cancelled: CancelledBody = Self::handle_response(response).await?;

        Ok(CancelReceipt {
            acknowledgement: cancelled.acknowledgement,
            status: cancelled.status,
            cancelled_at: cancelled.cancelled_at.unwrap_or_else(Utc::now),
        })
    }

    async fn query_status(&self, query: &StatusQuery) -> PacResult<SatStatus> {
        let params = StatusParams {
            uuid: query.uuid.clone(),
            emitter_rfc: query.emitter_rfc.clone(),
            receiver_rfc: query.receiver_rfc.clone(),
            total: shared::money::fmt2(query.total),
        };
        let request = self.authorized(self.client.get(self.url(STATUS_PATH)).query(&params));
        let response = request.send().await?;
        let body: StatusBody = Self::handle_response(response).await?;

        Ok(SatStatus {
            state: parse_sat_state(&body.state)?,
            cancellable: body.cancellable,
            cancellation_state: body.cancellation_state,
        })
    }
}

/// Map a non-2xx response onto the error taxonomy
pub(crate) fn error_from_response(status: StatusCode, text: &str) -> PacError {
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            return PacError::Unreachable(format!("HTTP {}", status.as_u16()));
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return PacError::Unauthorized(text.to_string());
        }
        _ => {}
    }

    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) if is_already_stamped(&body) => PacError::AlreadyStamped {
            message: body.message,
            uuid: body.uuid,
        },
        Ok(body) => PacError::Rejected {
            code: body.code,
            message: body.message,
        },
        Err(_) if status.is_server_error() => {
            PacError::Unreachable(format!("HTTP {}: {}", status.as_u16(), text))
        }
        Err(_) => PacError::Rejected {
            code: status.as_u16().to_string(),
            message: text.to_string(),
        },
    }
}

fn is_already_stamped(body: &ErrorBody) -> bool {
    body.code == ALREADY_STAMPED_CODE || body.message.to_lowercase().contains("previamente timbrado")
}

/// Build a receipt, filling gaps from the TimbreFiscalDigital in the XML
pub(crate) fn receipt_from_body(body: StampedBody) -> PacResult<StampReceipt> {
    let root = XmlNode::parse(&body.xml)
        .map_err(|e| PacError::InvalidResponse(format!("stamped XML: {}", e)))?;
    let tfd = root.find("TimbreFiscalDigital");
    let from_tfd = |attr: &str| tfd.and_then(|t| t.attr(attr)).map(str::to_string);

    let uuid = body
        .uuid
        .or_else(|| from_tfd("UUID"))
        .ok_or_else(|| PacError::InvalidResponse("missing UUID".into()))?;
    let pac_seal = body
        .sat_seal
        .or_else(|| from_tfd("SelloSAT"))
        .ok_or_else(|| PacError::InvalidResponse("missing SelloSAT".into()))?;
    let pac_certificate_number = body
        .sat_certificate_number
        .or_else(|| from_tfd("NoCertificadoSAT"))
        .ok_or_else(|| PacError::InvalidResponse("missing NoCertificadoSAT".into()))?;
    let stamped_at = body
        .stamped_at
        .or_else(|| from_tfd("FechaTimbrado"))
        .ok_or_else(|| PacError::InvalidResponse("missing FechaTimbrado".into()))?;
    let stamped_at = NaiveDateTime::parse_from_str(&stamped_at, STAMP_DATE_FORMAT)
        .map_err(|e| PacError::InvalidResponse(format!("FechaTimbrado '{}': {}", stamped_at, e)))?;

    Ok(StampReceipt {
        uuid,
        stamped_xml: body.xml,
        pac_seal,
        pac_certificate_number,
        stamped_at,
    })
}

fn parse_sat_state(state: &str) -> PacResult<SatDocumentState> {
    match state.trim() {
        "Vigente" => Ok(SatDocumentState::Active),
        "Cancelado" => Ok(SatDocumentState::Cancelled),
        "No Encontrado" => Ok(SatDocumentState::NotFound),
        other => Err(PacError::InvalidResponse(format!("unknown SAT state: {}", other))),
    }
}
