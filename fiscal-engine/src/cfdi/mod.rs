//! CFDI 4.0 documents
//!
//! - [`invoice`]: income CFDI (type `I`) from a [`ValidatedInvoice`](crate::validation::ValidatedInvoice)
//! - [`payment`]: payment CFDI (type `P`) with the Pagos 2.0 complement
//! - [`cadena`]: cadena original per the SAT XSLT
//! - [`seal`]: CSD sealing (`NoCertificado`, `Sello`, `Certificado`)

pub mod cadena;
pub mod invoice;
pub mod payment;
pub mod seal;

pub use cadena::{cadena_original, cadena_original_of};
pub use invoice::build_invoice;
pub use payment::{ComplementInput, build_payment_document, compute_figures};
pub use seal::{SealError, SealedDocument, seal_document};

pub const CFDI_VERSION: &str = "4.0";
pub const CFDI_NAMESPACE: &str = "http://www.sat.gob.mx/cfd/4";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const CFDI_SCHEMA_LOCATION: &str =
    "http://www.sat.gob.mx/cfd/4 http://www.sat.gob.mx/sitio_internet/cfd/4/cfdv40.xsd";

/// `Fecha` / `FechaPago` format (local time, no offset)
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// `Exportacion`: not an export
pub const NOT_EXPORT: &str = "01";
/// `ObjetoImp`: taxable
pub const TAXABLE: &str = "02";
/// `ObjetoImp`: not taxable
pub const NOT_TAXABLE: &str = "01";
/// `Impuesto`: IVA
pub const TAX_IVA: &str = "002";
pub const FACTOR_RATE: &str = "Tasa";
