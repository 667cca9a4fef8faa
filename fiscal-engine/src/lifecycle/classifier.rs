//! Error classifier
//!
//! Maps engine, CSD and PAC failures onto [`ClassifiedError`]. Total: a PAC
//! code that is not in the table still becomes a generic PAC rejection
//! carrying the raw code and message.

use csd_cert::CertError;
use pac_client::PacError;
use shared::{ClassifiedError, ErrorCode};

use super::error::EngineError;

struct KnownCode {
    raw: &'static str,
    code: ErrorCode,
    title: &'static str,
    remediation: &'static [&'static str],
}

/// SAT/PAC codes with a specific classification
const KNOWN_CODES: &[KnownCode] = &[
    // ========== Stamping (timbrado) ==========
    KnownCode {
        raw: "301",
        code: ErrorCode::MalformedDocument,
        title: "XML mal formado",
        remediation: &["Revise que el comprobante cumpla con el esquema CFDI 4.0"],
    },
    KnownCode {
        raw: "302",
        code: ErrorCode::InvalidSeal,
        title: "Sello mal formado o inválido",
        remediation: &["Vuelva a generar el sello con el CSD vigente del emisor"],
    },
    KnownCode {
        raw: "303",
        code: ErrorCode::CertificateRejected,
        title: "El sello no corresponde al emisor",
        remediation: &["Use un CSD emitido para el RFC del emisor"],
    },
    KnownCode {
        raw: "304",
        code: ErrorCode::CertificateRejected,
        title: "Certificado revocado o caduco",
        remediation: &["Tramite un nuevo CSD ante el SAT y configúrelo"],
    },
    KnownCode {
        raw: "305",
        code: ErrorCode::CertificateExpired,
        title: "La fecha de emisión no está dentro de la vigencia del CSD",
        remediation: &[
            "Verifique la fecha de emisión de la factura",
            "Configure un CSD vigente para el emisor",
        ],
    },
    KnownCode {
        raw: "307",
        code: ErrorCode::AlreadyStamped,
        title: "El comprobante ya fue timbrado",
        remediation: &["Consulte el estado del UUID y registre el timbrado existente"],
    },
    KnownCode {
        raw: "401",
        code: ErrorCode::IssueDateOutOfRange,
        title: "Fecha de emisión fuera de rango",
        remediation: &["La fecha de emisión debe estar dentro de las últimas 72 horas"],
    },
    KnownCode {
        raw: "402",
        code: ErrorCode::EmitterNotRegistered,
        title: "El RFC del emisor no está en la lista de contribuyentes obligados",
        remediation: &["Verifique que el CSD esté activo en el SAT; puede tardar hasta 72 horas"],
    },
    KnownCode {
        raw: "CFDI40102",
        code: ErrorCode::InvalidSeal,
        title: "El sello no corresponde al contenido del comprobante",
        remediation: &[
            "Corrija los datos de la factura y vuelva a timbrar",
            "Verifique que el certificado y la llave privada correspondan",
        ],
    },
    KnownCode {
        raw: "CFDI40144",
        code: ErrorCode::ReceiverMismatch,
        title: "El RFC del receptor no está en la lista de RFC inscritos",
        remediation: &["Confirme el RFC del receptor con su constancia de situación fiscal"],
    },
    KnownCode {
        raw: "CFDI40145",
        code: ErrorCode::ReceiverMismatch,
        title: "El nombre del receptor no corresponde con el RFC",
        remediation: &[
            "Capture el nombre exactamente como aparece en la constancia de situación fiscal, sin régimen societario",
        ],
    },
    KnownCode {
        raw: "CFDI40147",
        code: ErrorCode::ReceiverMismatch,
        title: "El código postal del receptor no corresponde con el RFC",
        remediation: &["Use el código postal del domicilio fiscal del receptor"],
    },
    KnownCode {
        raw: "CFDI40157",
        code: ErrorCode::ReceiverMismatch,
        title: "El régimen fiscal del receptor no es válido para su RFC",
        remediation: &["Confirme el régimen fiscal del receptor en su constancia de situación fiscal"],
    },
    KnownCode {
        raw: "CFDI40161",
        code: ErrorCode::ReceiverMismatch,
        title: "El uso CFDI no corresponde con el régimen fiscal del receptor",
        remediation: &["Elija un uso CFDI permitido para el régimen del receptor"],
    },
    // ========== Cancellation ==========
    KnownCode {
        raw: "202",
        code: ErrorCode::AlreadyCancelled,
        title: "El comprobante ya fue cancelado",
        remediation: &[],
    },
    KnownCode {
        raw: "203",
        code: ErrorCode::UuidNotOwned,
        title: "El UUID no corresponde al emisor",
        remediation: &["Verifique el UUID y el RFC del emisor"],
    },
    KnownCode {
        raw: "205",
        code: ErrorCode::UuidNotFound,
        title: "El UUID no existe en el SAT",
        remediation: &["El SAT puede tardar hasta 72 horas en registrar un timbrado reciente"],
    },
    KnownCode {
        raw: "CANC108",
        code: ErrorCode::SubstituteUuidRequired,
        title: "El motivo 01 requiere el UUID que sustituye",
        remediation: &["Indique el UUID del comprobante que sustituye al cancelado"],
    },
];

/// Classify a raw PAC code and message
pub fn classify_raw(raw_code: &str, message: &str) -> ClassifiedError {
    let raw_code = raw_code.trim();
    let known = KNOWN_CODES
        .iter()
        .find(|k| k.raw.eq_ignore_ascii_case(raw_code));

    let Some(known) = known else {
        let detail = if raw_code.is_empty() {
            message.to_string()
        } else {
            format!("{} - {}", raw_code, message)
        };
        let err = ClassifiedError::new(ErrorCode::PacRejected, detail);
        return if raw_code.is_empty() {
            err
        } else {
            err.with_raw_code(raw_code)
        };
    };

    let mut err = ClassifiedError::new(known.code, format!("{} - {}", raw_code, message))
        .with_title(known.title)
        .with_raw_code(raw_code);
    for step in known.remediation {
        err = err.with_remediation(*step);
    }
    err
}

pub fn classify_pac(err: &PacError) -> ClassifiedError {
    match err {
        PacError::Unreachable(detail) => ClassifiedError::new(ErrorCode::PacUnreachable, detail)
            .with_remediation("Intente de nuevo en unos minutos"),
        PacError::InvalidResponse(detail) => {
            ClassifiedError::new(ErrorCode::PacInvalidResponse, detail)
        }
        PacError::Rejected { code, message } => classify_raw(code, message),
        PacError::AlreadyStamped { message, uuid } => {
            let detail = match uuid {
                Some(uuid) => format!("{} (UUID {})", message, uuid),
                None => message.clone(),
            };
            classify_raw("307", &detail)
        }
        PacError::Unauthorized(detail) => ClassifiedError::new(ErrorCode::PacRejected, detail)
            .with_title("El PAC rechazó las credenciales de la cuenta")
            .with_remediation("Verifique el token del PAC en la configuración"),
        PacError::SubstituteUuidRequired => classify_raw("CANC108", &err.to_string()),
        PacError::InvalidRequest(detail) => ClassifiedError::new(ErrorCode::ValidationFailed, detail),
    }
}

pub fn classify_cert(err: &CertError) -> ClassifiedError {
    let detail = err.to_string();
    match err {
        CertError::WrongPassphrase => ClassifiedError::new(ErrorCode::WrongPassphrase, detail)
            .with_remediation("Capture de nuevo la contraseña de la llave privada"),
        CertError::KeyMismatch => ClassifiedError::new(ErrorCode::KeyCertificateMismatch, detail)
            .with_remediation("Cargue el archivo .key que corresponde al .cer"),
        CertError::NotValidAt { .. } => ClassifiedError::new(ErrorCode::CertificateExpired, detail)
            .with_remediation("Configure un CSD vigente para el emisor"),
        CertError::InvalidCertificate(_) => ClassifiedError::new(ErrorCode::InvalidCertificate, detail),
        CertError::MalformedKey(_) => ClassifiedError::new(ErrorCode::MalformedKey, detail)
            .with_remediation("Cargue la llave privada .key tal como la entregó el SAT"),
        CertError::Io(_) => ClassifiedError::new(ErrorCode::CertificateUnavailable, detail),
        CertError::SigningFailed(_) | CertError::VerificationFailed(_) => {
            ClassifiedError::new(ErrorCode::SigningFailed, detail)
        }
    }
}

pub fn classify(err: &EngineError) -> ClassifiedError {
    let detail = err.to_string();
    match err {
        EngineError::Validation(messages) => {
            let mut classified = ClassifiedError::new(ErrorCode::ValidationFailed, messages.join("\n"));
            for message in messages {
                classified = classified.with_remediation(message.clone());
            }
            classified
        }
        EngineError::NotFound { .. } => ClassifiedError::new(ErrorCode::NotFound, detail),
        EngineError::StateConflict { .. } => ClassifiedError::new(ErrorCode::StateConflict, detail),
        EngineError::ComplementAlreadyIssued { .. } => {
            ClassifiedError::new(ErrorCode::ComplementAlreadyIssued, detail)
        }
        EngineError::OriginNotStamped { .. } => {
            ClassifiedError::new(ErrorCode::OriginNotStamped, detail)
        }
        EngineError::NotDeferredPayment(_) => {
            ClassifiedError::new(ErrorCode::NotDeferredPayment, detail)
        }
        EngineError::PaymentExceedsBalance { .. } => {
            ClassifiedError::new(ErrorCode::PaymentExceedsBalance, detail)
        }
        EngineError::CredentialsUnavailable { .. } => {
            ClassifiedError::new(ErrorCode::CertificateUnavailable, detail)
                .with_remediation("Cargue el CSD (.cer, .key y contraseña) del emisor")
        }
        EngineError::CertificateRfcMismatch { .. } => {
            ClassifiedError::new(ErrorCode::CertificateRfcMismatch, detail)
        }
        EngineError::Certificate(e) => classify_cert(e),
        EngineError::Xml(_) => ClassifiedError::new(ErrorCode::XmlError, detail),
        EngineError::Pac(e) => classify_pac(e),
        EngineError::Persistence(_) => ClassifiedError::new(ErrorCode::PersistenceFailed, detail)
            .with_title("No se pudo guardar el resultado"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::FiscalState;
    use shared::{ErrorCategory, RetryPolicy};

    #[test]
    fn test_known_sat_code() {
        let err = classify_raw("CFDI40102", "El resultado de la digestión debe ser igual...");
        assert_eq!(err.code, ErrorCode::InvalidSeal);
        assert_eq!(err.category, ErrorCategory::PacRejected);
        assert_eq!(err.raw_code.as_deref(), Some("CFDI40102"));
        assert_eq!(err.remediation.len(), 2);
        assert!(err.detail.contains("digestión"));
        assert_eq!(err.retry_policy(), RetryPolicy::AfterFix);
    }

    #[test]
    fn test_unknown_code_is_generic_pac_error() {
        let err = classify_raw("CFDI49999", "algo raro");
        assert_eq!(err.code, ErrorCode::PacRejected);
        assert_eq!(err.title, "Error del PAC");
        assert_eq!(err.detail, "CFDI49999 - algo raro");
        assert_eq!(err.raw_code.as_deref(), Some("CFDI49999"));

        let err = classify_raw("", "sin código");
        assert_eq!(err.code, ErrorCode::PacRejected);
        assert_eq!(err.raw_code, None);
    }

    #[test]
    fn test_expired_csd_code_is_credential_error() {
        let err = classify_raw("305", "Fecha fuera de vigencia");
        assert_eq!(err.category, ErrorCategory::Credential);
    }

    #[test]
    fn test_pac_errors() {
        let unreachable = classify_pac(&PacError::Unreachable("timeout".into()));
        assert_eq!(unreachable.category, ErrorCategory::PacUnavailable);
        assert!(unreachable.is_retriable());

        let stamped = classify_pac(&PacError::AlreadyStamped {
            message: "CFDI previamente timbrado".into(),
            uuid: Some("ABCD-1234".into()),
        });
        assert_eq!(stamped.code, ErrorCode::AlreadyStamped);
        assert!(stamped.detail.contains("ABCD-1234"));

        let substitute = classify_pac(&PacError::SubstituteUuidRequired);
        assert_eq!(substitute.category, ErrorCategory::Validation);
    }

    #[test]
    fn test_cert_errors_are_not_retriable_as_is() {
        for err in [
            CertError::WrongPassphrase,
            CertError::KeyMismatch,
            CertError::MalformedKey("bad".into()),
        ] {
            let classified = classify_cert(&err);
            assert!(!classified.is_retriable(), "{:?}", classified);
        }
        assert_eq!(classify_cert(&CertError::WrongPassphrase).category, ErrorCategory::Credential);
        assert_eq!(classify_cert(&CertError::MalformedKey("x".into())).category, ErrorCategory::Signing);
    }

    #[test]
    fn test_engine_errors() {
        let conflict = EngineError::state_conflict("factura-1", FiscalState::Stamped, "stamp");
        let classified = conflict.classify();
        assert_eq!(classified.category, ErrorCategory::StateConflict);
        assert!(classified.detail.contains("factura-1"));

        let validation = EngineError::Validation(vec!["uno".into(), "dos".into()]).classify();
        assert_eq!(validation.category, ErrorCategory::Validation);
        assert_eq!(validation.remediation, vec!["uno", "dos"]);
    }
}
