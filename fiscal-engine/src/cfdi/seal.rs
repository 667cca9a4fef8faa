//! CSD sealing
//!
//! `NoCertificado` is part of the cadena original, so it is set before the
//! cadena is computed. `Sello` and `Certificado` are not, and are added after.

use csd_cert::{CertError, CsdSigner};
use shared::xml::{XmlError, XmlNode};
use thiserror::Error;

use super::cadena::cadena_original_of;

#[derive(Debug, Error)]
pub enum SealError {
    #[error(transparent)]
    Cert(#[from] CertError),

    #[error(transparent)]
    Xml(#[from] XmlError),
}

/// A sealed CFDI ready for the PAC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedDocument {
    /// Document with `NoCertificado` but without `Sello`/`Certificado`
    pub unsigned_xml: String,
    pub signed_xml: String,
    pub cadena_original: String,
    pub seal: String,
    pub certificate_number: String,
}

pub fn seal_document(mut document: XmlNode, signer: &CsdSigner) -> Result<SealedDocument, SealError> {
    document.set_attr("NoCertificado", signer.certificate_number());
    let unsigned_xml = document.render()?;
    let cadena_original = cadena_original_of(&document);

    let seal = signer.seal(&cadena_original)?;
    document.set_attr("Sello", seal.seal.as_str());
    document.set_attr("Certificado", seal.certificate.as_str());
    let signed_xml = document.render()?;

    tracing::debug!(
        certificate_number = %seal.certificate_number,
        cadena_len = cadena_original.len(),
        "CFDI sealed"
    );

    Ok(SealedDocument {
        unsigned_xml,
        signed_xml,
        cadena_original,
        seal: seal.seal,
        certificate_number: seal.certificate_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfdi::{build_invoice, cadena_original};
    use crate::fixtures::draft;
    use crate::validation::Validator;
    use csd_cert::testing::{CERTIFICATE_NUMBER, valid_csd};
    use csd_cert::verify_seal;

    #[test]
    fn test_seal_document() {
        let validated = Validator::default().validate(draft()).unwrap();
        let signer = valid_csd().credential().unlock().unwrap();

        let sealed = seal_document(build_invoice(&validated), &signer).unwrap();

        assert_eq!(sealed.certificate_number, CERTIFICATE_NUMBER);
        assert!(sealed.cadena_original.contains(&format!("|{}|", CERTIFICATE_NUMBER)));
        // Sello and Certificado do not change the cadena
        assert_eq!(cadena_original(&sealed.signed_xml).unwrap(), sealed.cadena_original);
        assert!(!sealed.unsigned_xml.contains("Sello="));

        let root = XmlNode::parse(&sealed.signed_xml).unwrap();
        assert_eq!(root.attr("Sello"), Some(sealed.seal.as_str()));
        assert_eq!(root.attr("NoCertificado"), Some(CERTIFICATE_NUMBER));
        verify_seal(
            &valid_csd().certificate_der,
            &sealed.cadena_original,
            &sealed.seal,
        )
        .unwrap();
    }
}
