use crate::state::{MockState, ScriptedFailure, StampedDocument};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use pac_client::wire::{
    ALREADY_STAMPED_CODE, CANCEL_PATH, CancelBody, CancelledBody, ErrorBody, STAMP_PATH,
    STATUS_PATH, StampBody, StampedBody, StatusBody, StatusParams,
};
use sha2::{Digest, Sha256};
use shared::xml::XmlNode;
use std::sync::Arc;

/// Serial of the mock's SAT certificate
pub const SAT_CERTIFICATE_NUMBER: &str = "30001000000500003456";
/// RFC of the mock certification provider
pub const PROVIDER_RFC: &str = "SPR190613I52";

const TFD_NAMESPACE: &str = "http://www.sat.gob.mx/TimbreFiscalDigital";
const TFD_SCHEMA_LOCATION: &str = "http://www.sat.gob.mx/TimbreFiscalDigital http://www.sat.gob.mx/sitio_internet/cfd/TimbreFiscalDigital/TimbreFiscalDigitalv11.xsd";

type ApiError = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn reject(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            code: code.to_string(),
            message: message.into(),
            uuid: None,
        }),
    )
}

fn scripted(failure: ScriptedFailure) -> ApiError {
    match failure {
        ScriptedFailure::Reject {
            status,
            code,
            message,
        } => reject(
            StatusCode::from_u16(status).unwrap_or(StatusCode::UNPROCESSABLE_ENTITY),
            &code,
            message,
        ),
        ScriptedFailure::Unavailable => reject(
            StatusCode::SERVICE_UNAVAILABLE,
            "503",
            "Servicio no disponible",
        ),
    }
}

fn check_auth(state: &MockState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.token else {
        return Ok(());
    };
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if token == expected => Ok(()),
        _ => Err(reject(
            StatusCode::UNAUTHORIZED,
            "AUTH",
            "Missing or invalid Authorization header",
        )),
    }
}

async fn simulate_latency(state: &MockState) {
    if let Some(delay) = state.delay() {
        tokio::time::sleep(delay).await;
    }
}

async fn stamp(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(req): Json<StampBody>,
) -> ApiResult<StampedBody> {
    state.record_stamp_call();
    check_auth(&state, &headers)?;
    simulate_latency(&state).await;
    if let Some(failure) = state.take_stamp_failure() {
        return Err(scripted(failure));
    }

    // 1. Structural checks
    let mut root = XmlNode::parse(&req.xml)
        .map_err(|e| reject(StatusCode::UNPROCESSABLE_ENTITY, "301", format!("XML mal formado: {}", e)))?;
    if root.local_name() != "Comprobante" {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "301",
            "XML mal formado: el nodo raíz debe ser cfdi:Comprobante",
        ));
    }
    let seal = match root.attr("Sello") {
        Some(seal) if !seal.is_empty() => seal.to_string(),
        _ => {
            return Err(reject(
                StatusCode::UNPROCESSABLE_ENTITY,
                "302",
                "Sello mal formado o inválido",
            ));
        }
    };

    // 2. Duplicate submission
    if let Some(uuid) = state.uuid_for_seal(&seal) {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorBody {
                code: ALREADY_STAMPED_CODE.to_string(),
                message: "CFDI previamente timbrado".to_string(),
                uuid: Some(uuid),
            }),
        ));
    }

    // 3. Timbre fiscal digital
    let uuid = uuid::Uuid::new_v4().to_string().to_uppercase();
    let stamped_at = Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string();
    let sat_seal = BASE64.encode(Sha256::digest(format!("||1.1|{}|{}|{}||", uuid, stamped_at, seal)));

    let tfd = XmlNode::new("tfd:TimbreFiscalDigital")
        .attr_with("xmlns:tfd", TFD_NAMESPACE)
        .attr_with("xsi:schemaLocation", TFD_SCHEMA_LOCATION)
        .attr_with("Version", "1.1")
        .attr_with("UUID", uuid.as_str())
        .attr_with("FechaTimbrado", stamped_at.as_str())
        .attr_with("RfcProvCertif", PROVIDER_RFC)
        .attr_with("SelloCFD", seal.as_str())
        .attr_with("NoCertificadoSAT", SAT_CERTIFICATE_NUMBER)
        .attr_with("SelloSAT", sat_seal.as_str());

    match root.child_mut("Complemento") {
        Some(complemento) => complemento.push(tfd),
        None => root.push(XmlNode::new("cfdi:Complemento").child_with(tfd)),
    }

    let xml = root.render().map_err(|e| {
        reject(StatusCode::INTERNAL_SERVER_ERROR, "500", e.to_string())
    })?;

    let attr_of = |child: &str, attr: &str| {
        root.child(child)
            .and_then(|n| n.attr(attr))
            .unwrap_or_default()
            .to_string()
    };
    state.insert(
        seal,
        StampedDocument {
            uuid: uuid.clone(),
            emitter_rfc: attr_of("Emisor", "Rfc"),
            receiver_rfc: attr_of("Receptor", "Rfc"),
            total: root.attr("Total").unwrap_or_default().to_string(),
            cancelled: false,
        },
    );
    tracing::info!(uuid = %uuid, "Mock PAC stamped CFDI");

    if state.minimal_responses() {
        return Ok(Json(StampedBody {
            xml,
            ..Default::default()
        }));
    }
    Ok(Json(StampedBody {
        xml,
        uuid: Some(uuid),
        sat_seal: Some(sat_seal),
        sat_certificate_number: Some(SAT_CERTIFICATE_NUMBER.to_string()),
        stamped_at: Some(stamped_at),
    }))
}

async fn cancel(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(req): Json<CancelBody>,
) -> ApiResult<CancelledBody> {
    state.record_cancel_call();
    check_auth(&state, &headers)?;
    simulate_latency(&state).await;
    if let Some(failure) = state.take_cancel_failure() {
        return Err(scripted(failure));
    }

    if req.reason == "01" && req.substitute_uuid.is_none() {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "CANC108",
            "El motivo 01 requiere el folio de sustitución",
        ));
    }

    let Some(document) = state.document(&req.uuid) else {
        return Err(reject(StatusCode::NOT_FOUND, "205", "UUID no existe"));
    };
    if !document.emitter_rfc.eq_ignore_ascii_case(&req.emitter_rfc) {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "203",
            "UUID no corresponde al emisor",
        ));
    }
    if document.cancelled {
        return Err(reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "202",
            "UUID previamente cancelado",
        ));
    }

    state.cancel(&req.uuid);
    let cancelled_at = Utc::now();
    tracing::info!(uuid = %document.uuid, reason = %req.reason, "Mock PAC cancelled CFDI");

    Ok(Json(CancelledBody {
        acknowledgement: format!(
            "<Acuse Fecha=\"{}\" RfcEmisor=\"{}\"><Folios><UUID>{}</UUID><EstatusUUID>201</EstatusUUID></Folios></Acuse>",
            cancelled_at.format("%Y-%m-%dT%H:%M:%S"),
            document.emitter_rfc,
            document.uuid
        ),
        status: "Cancelado".to_string(),
        cancelled_at: Some(cancelled_at),
    }))
}

async fn status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<StatusParams>,
) -> ApiResult<StatusBody> {
    check_auth(&state, &headers)?;
    simulate_latency(&state).await;

    let body = match state.document(&params.uuid) {
        Some(document) if document.cancelled => StatusBody {
            state: "Cancelado".to_string(),
            cancellable: Some("No cancelable".to_string()),
            cancellation_state: Some("Cancelado sin aceptación".to_string()),
        },
        Some(_) => StatusBody {
            state: "Vigente".to_string(),
            cancellable: Some("Cancelable sin aceptación".to_string()),
            cancellation_state: None,
        },
        None => StatusBody {
            state: "No Encontrado".to_string(),
            cancellable: None,
            cancellation_state: None,
        },
    };
    Ok(Json(body))
}

pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route(STAMP_PATH, post(stamp))
        .route(CANCEL_PATH, post(cancel))
        .route(STATUS_PATH, get(status))
        .with_state(state)
}
