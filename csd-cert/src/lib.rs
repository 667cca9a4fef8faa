//! CSD (Certificado de Sello Digital) handling
//!
//! Loads SAT certificates and encrypted private keys, reads the certificate
//! number and RFC, and produces RSA-SHA256 seals over a cadena original.

mod credential;
mod crypto;
mod error;
mod metadata;
pub mod signer;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use credential::CsdCredential;
pub use crypto::{sign, verify};
pub use error::{CertError, Result};
pub use metadata::CsdMetadata;
pub use signer::{CsdSigner, Seal, verify_seal};
