//! Fiscal party (Emisor / Receptor)

use serde::{Deserialize, Serialize};

/// A taxpayer appearing on an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalParty {
    pub id: String,
    /// RFC: 12 chars for legal entities, 13 for individuals
    pub rfc: String,
    /// Legal name as registered at SAT
    pub name: String,
    /// c_RegimenFiscal code
    pub tax_regime: String,
    /// Fiscal domicile postal code. For the emitter this is LugarExpedicion.
    pub postal_code: Option<String>,
    /// c_UsoCFDI code (receiver only)
    pub cfdi_use: Option<String>,
}

impl FiscalParty {
    /// Normalized RFC (trimmed, uppercase)
    pub fn normalized_rfc(&self) -> String {
        self.rfc.trim().to_uppercase()
    }

    /// Whether the RFC belongs to an individual (persona física)
    pub fn is_individual(&self) -> bool {
        self.rfc.trim().chars().count() == 13
    }
}
