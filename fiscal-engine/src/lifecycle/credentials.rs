//! CSD credentials provider
//!
//! The engine asks for the active CSD of an emitter RFC in one environment
//! right before signing and drops it afterwards. Providers must not log the
//! key or the passphrase.

use async_trait::async_trait;
use csd_cert::{CertError, CsdCredential};
use parking_lot::RwLock;
use shared::models::Environment;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::error::EngineError;

pub const CERTIFICATE_FILE: &str = "csd.cer";
pub const KEY_FILE: &str = "csd.key";
pub const PASSPHRASE_FILE: &str = "passphrase";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("No active CSD for {rfc} in {environment}")]
    NotFound {
        rfc: String,
        environment: Environment,
    },

    #[error(transparent)]
    Cert(#[from] CertError),
}

impl From<CredentialsError> for EngineError {
    fn from(err: CredentialsError) -> Self {
        match err {
            CredentialsError::NotFound { rfc, environment } => {
                EngineError::CredentialsUnavailable { rfc, environment }
            }
            CredentialsError::Cert(e) => EngineError::Certificate(e),
        }
    }
}

#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn active_certificate(
        &self,
        rfc: &str,
        environment: Environment,
    ) -> Result<CsdCredential, CredentialsError>;
}

/// Reads `<root>/<RFC>/<environment>/{csd.cer, csd.key, passphrase}`
#[derive(Debug, Clone)]
pub struct FileCredentialsProvider {
    root: PathBuf,
}

impl FileCredentialsProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn directory_for(&self, rfc: &str, environment: Environment) -> PathBuf {
        self.root
            .join(rfc.trim().to_uppercase())
            .join(environment.as_str())
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn active_certificate(
        &self,
        rfc: &str,
        environment: Environment,
    ) -> Result<CsdCredential, CredentialsError> {
        let dir = self.directory_for(rfc, environment);
        if !tokio::fs::try_exists(dir.join(CERTIFICATE_FILE))
            .await
            .unwrap_or(false)
        {
            return Err(CredentialsError::NotFound {
                rfc: rfc.to_string(),
                environment,
            });
        }

        let certificate = read(&dir, CERTIFICATE_FILE).await?;
        let private_key = read(&dir, KEY_FILE).await?;
        let passphrase = read(&dir, PASSPHRASE_FILE).await?;
        let passphrase = String::from_utf8_lossy(&passphrase).trim_end().to_string();

        tracing::debug!(rfc = %rfc, environment = %environment, "CSD loaded from disk");
        Ok(CsdCredential::new(certificate, private_key, passphrase))
    }
}

async fn read(dir: &Path, file: &str) -> Result<Vec<u8>, CredentialsError> {
    tokio::fs::read(dir.join(file))
        .await
        .map_err(|e| CredentialsError::Cert(CertError::Io(e)))
}

/// Credentials held in memory, keyed by RFC and environment
#[derive(Default)]
pub struct StaticCredentials {
    credentials: RwLock<HashMap<(String, Environment), CsdCredential>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, rfc: &str, environment: Environment, credential: CsdCredential) {
        self.credentials
            .write()
            .insert((rfc.trim().to_uppercase(), environment), credential);
    }

    pub fn with(self, rfc: &str, environment: Environment, credential: CsdCredential) -> Self {
        self.insert(rfc, environment, credential);
        self
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn active_certificate(
        &self,
        rfc: &str,
        environment: Environment,
    ) -> Result<CsdCredential, CredentialsError> {
        self.credentials
            .read()
            .get(&(rfc.trim().to_uppercase(), environment))
            .cloned()
            .ok_or_else(|| CredentialsError::NotFound {
                rfc: rfc.to_string(),
                environment,
            })
    }
}
