use crate::crypto::der_or_pem;
use crate::error::{CertError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};
use x509_parser::oid_registry;

/// x500UniqueIdentifier, where SAT stores "RFC / CURP"
const OID_UNIQUE_IDENTIFIER: &str = "2.5.4.45";

/// Data SAT reads out of a CSD certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdMetadata {
    /// 20-digit NoCertificado
    pub certificate_number: String,
    /// Holder RFC, when present in the subject
    pub rfc: Option<String>,
    pub holder_name: Option<String>,
    pub fingerprint_sha256: String,
    /// Unix seconds
    pub not_before: i64,
    /// Unix seconds
    pub not_after: i64,
}

impl CsdMetadata {
    /// Parse a certificate given as DER or PEM
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let der = der_or_pem(bytes, "CERTIFICATE")?;
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let fingerprint_sha256 = hex::encode(Sha256::digest(der));

        let (_, x509) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| CertError::InvalidCertificate(format!("X509 parse error: {}", e)))?;

        let certificate_number = sat_certificate_number(x509.tbs_certificate.raw_serial());

        let mut rfc = None;
        let mut holder_name = None;
        let mut organization = None;
        for rdn in x509.subject().iter_rdn() {
            for attr in rdn.iter() {
                let oid = attr.attr_type();
                let value = attr.as_str().ok();
                if oid.to_id_string() == OID_UNIQUE_IDENTIFIER {
                    rfc = value.and_then(rfc_from_identifier);
                } else if oid == &oid_registry::OID_X509_COMMON_NAME {
                    holder_name = value.map(String::from);
                } else if oid == &oid_registry::OID_X509_ORGANIZATION_NAME {
                    organization = value.map(String::from);
                }
            }
        }

        Ok(Self {
            certificate_number,
            rfc,
            holder_name: holder_name.or(organization),
            fingerprint_sha256,
            not_before: x509.validity().not_before.timestamp(),
            not_after: x509.validity().not_after.timestamp(),
        })
    }

    /// Whether the certificate is within its validity window at `at` (UTC)
    pub fn is_valid_at(&self, at: NaiveDateTime) -> bool {
        let ts = at.and_utc().timestamp();
        self.not_before <= ts && ts <= self.not_after
    }

    pub fn ensure_valid_at(&self, at: NaiveDateTime) -> Result<()> {
        if self.is_valid_at(at) {
            Ok(())
        } else {
            Err(CertError::NotValidAt {
                certificate_number: self.certificate_number.clone(),
                at: at.to_string(),
            })
        }
    }

    pub fn not_after_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.not_after, 0)
    }

    /// Case-insensitive RFC comparison
    pub fn belongs_to(&self, rfc: &str) -> bool {
        self.rfc
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(rfc.trim()))
    }
}

/// SAT encodes the 20-digit certificate number as the ASCII bytes of the
/// serial. Anything else falls back to the hex serial.
fn sat_certificate_number(raw_serial: &[u8]) -> String {
    let digits: &[u8] = match raw_serial.first() {
        Some(0) => &raw_serial[1..],
        _ => raw_serial,
    };
    if !digits.is_empty() && digits.iter().all(u8::is_ascii_digit) {
        digits.iter().map(|b| char::from(*b)).collect()
    } else {
        hex::encode(raw_serial)
    }
}

/// "EKU9003173C9 / XIQB891116QE4" -> "EKU9003173C9"
fn rfc_from_identifier(value: &str) -> Option<String> {
    value
        .split('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
}
