use crate::crypto;
use crate::error::Result;
use crate::metadata::CsdMetadata;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pkcs8::SecretDocument;
use std::fmt;

/// Values injected into `cfdi:Comprobante` after signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seal {
    /// Base64 RSA-SHA256 signature of the cadena original (Sello)
    pub seal: String,
    /// 20-digit serial (NoCertificado)
    pub certificate_number: String,
    /// Base64 DER certificate (Certificado)
    pub certificate: String,
}

/// An unlocked CSD.
///
/// Callers can ask it to sign but never get the private key back. The
/// decrypted key is zeroized on drop.
pub struct CsdSigner {
    certificate_der: Vec<u8>,
    metadata: CsdMetadata,
    key: SecretDocument,
}

impl CsdSigner {
    pub(crate) fn new(certificate_der: Vec<u8>, metadata: CsdMetadata, key: SecretDocument) -> Self {
        Self {
            certificate_der,
            metadata,
            key,
        }
    }

    pub fn metadata(&self) -> &CsdMetadata {
        &self.metadata
    }

    pub fn certificate_number(&self) -> &str {
        &self.metadata.certificate_number
    }

    /// Certificate as base64 DER
    pub fn certificate_base64(&self) -> String {
        BASE64.encode(&self.certificate_der)
    }

    /// Sign the cadena original
    pub fn seal(&self, cadena_original: &str) -> Result<Seal> {
        let signature = crypto::sign(self.key.as_bytes(), cadena_original.as_bytes())?;
        Ok(Seal {
            seal: BASE64.encode(signature),
            certificate_number: self.metadata.certificate_number.clone(),
            certificate: self.certificate_base64(),
        })
    }

    /// Verify a base64 seal against the cadena with this certificate
    pub fn verify(&self, cadena_original: &str, seal: &str) -> Result<()> {
        verify_seal(&self.certificate_der, cadena_original, seal)
    }
}

/// Verify a base64 seal with a DER certificate
pub fn verify_seal(certificate_der: &[u8], cadena_original: &str, seal: &str) -> Result<()> {
    let signature = BASE64
        .decode(seal)
        .map_err(|e| crate::CertError::VerificationFailed(format!("Invalid seal encoding: {}", e)))?;
    crypto::verify(certificate_der, cadena_original.as_bytes(), &signature)
}

impl fmt::Debug for CsdSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsdSigner")
            .field("certificate_number", &self.metadata.certificate_number)
            .field("key", &"<redacted>")
            .finish()
    }
}
