use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    #[error("Wrong passphrase for the private key")]
    WrongPassphrase,

    #[error("Private key does not match the certificate")]
    KeyMismatch,

    #[error("Certificate {certificate_number} is not valid at {at}")]
    NotValidAt {
        certificate_number: String,
        at: String,
    },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

impl CertError {
    /// Credential problems need the user to supply a different CSD or passphrase
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            CertError::WrongPassphrase
                | CertError::KeyMismatch
                | CertError::NotValidAt { .. }
                | CertError::InvalidCertificate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CertError>;
