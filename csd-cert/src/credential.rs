//! CSD credential: certificate + encrypted private key + passphrase.
//!
//! The credential is supplied per signing operation and never written
//! anywhere by this crate. `Debug` output is redacted so it can sit inside
//! structs that get logged.

use crate::crypto;
use crate::error::Result;
use crate::metadata::CsdMetadata;
use crate::signer::CsdSigner;
use std::fmt;
use std::path::Path;

#[derive(Clone)]
pub struct CsdCredential {
    certificate: Vec<u8>,
    private_key: Vec<u8>,
    passphrase: String,
}

impl CsdCredential {
    /// Certificate and key may each be DER or PEM
    pub fn new(
        certificate: impl Into<Vec<u8>>,
        private_key: impl Into<Vec<u8>>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            certificate: certificate.into(),
            private_key: private_key.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Load a `.cer` / `.key` pair from disk
    pub fn from_files(
        certificate_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        passphrase: impl Into<String>,
    ) -> Result<Self> {
        let certificate = std::fs::read(certificate_path)?;
        let private_key = std::fs::read(key_path)?;
        Ok(Self::new(certificate, private_key, passphrase))
    }

    /// Certificate metadata; does not touch the private key
    pub fn metadata(&self) -> Result<CsdMetadata> {
        CsdMetadata::from_bytes(&self.certificate)
    }

    /// Decrypt the key, check it pairs with the certificate and return a
    /// signer holding the decrypted key in memory.
    pub fn unlock(&self) -> Result<CsdSigner> {
        let certificate_der = crypto::der_or_pem(&self.certificate, "CERTIFICATE")?;
        let metadata = CsdMetadata::from_der(&certificate_der)?;
        let key = crypto::decrypt_private_key(&self.private_key, &self.passphrase)?;
        crypto::ensure_key_matches(key.as_bytes(), &certificate_der)?;

        tracing::debug!(
            certificate_number = %metadata.certificate_number,
            "CSD unlocked"
        );

        Ok(CsdSigner::new(certificate_der, metadata, key))
    }
}

impl fmt::Debug for CsdCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsdCredential")
            .field("certificate", &format_args!("<{} bytes>", self.certificate.len()))
            .field("private_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}
