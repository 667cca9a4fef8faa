//! Fiscal error codes
//!
//! Every failure the engine reports maps to one of these codes. Codes are
//! organized by category (the leading digit decides the category):
//! - 1xxx: Validation errors (never sent to the PAC)
//! - 2xxx: Credential errors (CSD passphrase, mismatch, expiry)
//! - 3xxx: Signing errors (malformed key material)
//! - 4xxx: PAC rejections (the PAC/SAT refused the request)
//! - 5xxx: PAC unavailable (network, timeout)
//! - 6xxx: State conflicts (operation not allowed in the current fiscal state)
//! - 7xxx: Persistence errors (fiscal act happened, local save failed)
//! - 9xxx: Internal errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fiscal error code enum
///
/// Represented as u16 values so hosts can store and compare them without
/// depending on the Rust enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 1xxx: Validation ====================
    /// Invoice data failed validation
    ValidationFailed = 1001,
    /// Record not found in storage
    NotFound = 1002,
    /// Cancellation reason 01 without substitute UUID
    SubstituteUuidRequired = 1003,
    /// Unknown cancellation reason code
    InvalidCancellationReason = 1004,
    /// Payment exceeds the outstanding balance
    PaymentExceedsBalance = 1005,
    /// Origin invoice does not use deferred payment (PPD)
    NotDeferredPayment = 1006,

    // ==================== 2xxx: Credential ====================
    /// Wrong CSD passphrase
    WrongPassphrase = 2001,
    /// Certificate and private key do not match
    KeyCertificateMismatch = 2002,
    /// Certificate is expired or not yet valid
    CertificateExpired = 2003,
    /// No active certificate for the emitter
    CertificateUnavailable = 2004,
    /// Certificate belongs to another RFC
    CertificateRfcMismatch = 2005,
    /// Certificate could not be parsed
    InvalidCertificate = 2006,

    // ==================== 3xxx: Signing ====================
    /// Private key material is malformed
    MalformedKey = 3001,
    /// Signature computation failed
    SigningFailed = 3002,
    /// XML could not be produced or parsed
    XmlError = 3003,

    // ==================== 4xxx: PAC rejected ====================
    /// Generic PAC rejection
    PacRejected = 4001,
    /// Document was already stamped
    AlreadyStamped = 4002,
    /// Seal does not match the digest
    InvalidSeal = 4003,
    /// Receiver data does not match SAT records
    ReceiverMismatch = 4004,
    /// CSD revoked, expired or not issued by SAT
    CertificateRejected = 4005,
    /// Issue date outside the allowed window
    IssueDateOutOfRange = 4006,
    /// Malformed XML as seen by the PAC
    MalformedDocument = 4007,
    /// Emitter not registered in SAT's LCO
    EmitterNotRegistered = 4008,
    /// UUID not found at SAT
    UuidNotFound = 4101,
    /// Document was already cancelled
    AlreadyCancelled = 4102,
    /// UUID does not belong to the emitter
    UuidNotOwned = 4103,

    // ==================== 5xxx: PAC unavailable ====================
    /// PAC could not be reached or timed out
    PacUnreachable = 5001,
    /// PAC answered with something unparseable
    PacInvalidResponse = 5002,

    // ==================== 6xxx: State conflict ====================
    /// Operation not allowed in the current fiscal state
    StateConflict = 6001,
    /// Payment already has a complement
    ComplementAlreadyIssued = 6002,
    /// Origin invoice is not stamped
    OriginNotStamped = 6003,

    // ==================== 7xxx: Persistence ====================
    /// Saving the fiscal result failed
    PersistenceFailed = 7001,

    // ==================== 9xxx: Internal ====================
    /// Internal error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default short title for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Datos de factura incompletos o inconsistentes",
            ErrorCode::NotFound => "Registro no encontrado",
            ErrorCode::SubstituteUuidRequired => "El motivo 01 requiere el UUID que sustituye",
            ErrorCode::InvalidCancellationReason => "Motivo de cancelación inválido",
            ErrorCode::PaymentExceedsBalance => "El pago excede el saldo pendiente",
            ErrorCode::NotDeferredPayment => "La factura no es de pago diferido (PPD)",

            ErrorCode::WrongPassphrase => "Contraseña del CSD incorrecta",
            ErrorCode::KeyCertificateMismatch => "La llave privada no corresponde al certificado",
            ErrorCode::CertificateExpired => "El certificado no está vigente",
            ErrorCode::CertificateUnavailable => "No hay un CSD activo para el emisor",
            ErrorCode::CertificateRfcMismatch => "El CSD pertenece a otro RFC",
            ErrorCode::InvalidCertificate => "Certificado inválido",

            ErrorCode::MalformedKey => "Llave privada con formato inválido",
            ErrorCode::SigningFailed => "No se pudo generar el sello",
            ErrorCode::XmlError => "No se pudo generar el XML",

            ErrorCode::PacRejected => "Error del PAC",
            ErrorCode::AlreadyStamped => "El comprobante ya fue timbrado",
            ErrorCode::InvalidSeal => "Sello inválido",
            ErrorCode::ReceiverMismatch => "Datos del receptor no coinciden con el SAT",
            ErrorCode::CertificateRejected => "CSD rechazado por el SAT",
            ErrorCode::IssueDateOutOfRange => "Fecha de emisión fuera de rango",
            ErrorCode::MalformedDocument => "XML mal formado",
            ErrorCode::EmitterNotRegistered => "Emisor no registrado en la LCO",
            ErrorCode::UuidNotFound => "UUID no encontrado",
            ErrorCode::AlreadyCancelled => "El comprobante ya fue cancelado",
            ErrorCode::UuidNotOwned => "El UUID no corresponde al emisor",

            ErrorCode::PacUnreachable => "PAC no disponible",
            ErrorCode::PacInvalidResponse => "Respuesta inválida del PAC",

            ErrorCode::StateConflict => "Operación no permitida en el estado actual",
            ErrorCode::ComplementAlreadyIssued => "El pago ya tiene complemento",
            ErrorCode::OriginNotStamped => "La factura origen no está timbrada",

            ErrorCode::PersistenceFailed => "Timbrado exitoso, pero no se pudo guardar",

            ErrorCode::InternalError => "Error interno",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 to [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1001 => Ok(ErrorCode::ValidationFailed),
            1002 => Ok(ErrorCode::NotFound),
            1003 => Ok(ErrorCode::SubstituteUuidRequired),
            1004 => Ok(ErrorCode::InvalidCancellationReason),
            1005 => Ok(ErrorCode::PaymentExceedsBalance),
            1006 => Ok(ErrorCode::NotDeferredPayment),

            2001 => Ok(ErrorCode::WrongPassphrase),
            2002 => Ok(ErrorCode::KeyCertificateMismatch),
            2003 => Ok(ErrorCode::CertificateExpired),
            2004 => Ok(ErrorCode::CertificateUnavailable),
            2005 => Ok(ErrorCode::CertificateRfcMismatch),
            2006 => Ok(ErrorCode::InvalidCertificate),

            3001 => Ok(ErrorCode::MalformedKey),
            3002 => Ok(ErrorCode::SigningFailed),
            3003 => Ok(ErrorCode::XmlError),

            4001 => Ok(ErrorCode::PacRejected),
            4002 => Ok(ErrorCode::AlreadyStamped),
            4003 => Ok(ErrorCode::InvalidSeal),
            4004 => Ok(ErrorCode::ReceiverMismatch),
            4005 => Ok(ErrorCode::CertificateRejected),
            4006 => Ok(ErrorCode::IssueDateOutOfRange),
            4007 => Ok(ErrorCode::MalformedDocument),
            4008 => Ok(ErrorCode::EmitterNotRegistered),
            4101 => Ok(ErrorCode::UuidNotFound),
            4102 => Ok(ErrorCode::AlreadyCancelled),
            4103 => Ok(ErrorCode::UuidNotOwned),

            5001 => Ok(ErrorCode::PacUnreachable),
            5002 => Ok(ErrorCode::PacInvalidResponse),

            6001 => Ok(ErrorCode::StateConflict),
            6002 => Ok(ErrorCode::ComplementAlreadyIssued),
            6003 => Ok(ErrorCode::OriginNotStamped),

            7001 => Ok(ErrorCode::PersistenceFailed),

            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
