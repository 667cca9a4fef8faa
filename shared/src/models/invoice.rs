//! Invoice fiscal record (Comprobante)

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fiscal::{CancellationRecord, Environment, FiscalState, LastError, StampingResult};

/// Payment method for deferred payments (Pago en parcialidades o diferido)
pub const PAYMENT_METHOD_DEFERRED: &str = "PPD";

/// Invoice as stored by the host, with the fiscal fields the engine owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: String,
    pub series: Option<String>,
    pub folio: String,
    /// Local issue date (Fecha)
    pub issued_at: NaiveDateTime,
    /// ISO 4217 currency (Moneda)
    pub currency: String,
    /// Required for non-MXN currencies (TipoCambio)
    pub exchange_rate: Option<Decimal>,
    /// c_FormaPago
    pub payment_form: String,
    /// c_MetodoPago: PUE or PPD
    pub payment_method: String,
    /// Free-text payment terms (CondicionesDePago)
    pub payment_terms: Option<String>,
    /// Declared totals, checked against the line items before stamping
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub emitter_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub environment: Environment,
    /// CFDI this invoice relates to (e.g. substitution of a cancelled one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedCfdi>,
    #[serde(default)]
    pub fiscal: FiscalData,
}

impl InvoiceRecord {
    pub fn state(&self) -> FiscalState {
        self.fiscal.state
    }

    pub fn is_deferred_payment(&self) -> bool {
        self.payment_method == PAYMENT_METHOD_DEFERRED
    }

    /// Series and folio as shown to users (`A-1001`)
    pub fn display_folio(&self) -> String {
        match &self.series {
            Some(series) if !series.is_empty() => format!("{}-{}", series, self.folio),
            _ => self.folio.clone(),
        }
    }
}

/// CfdiRelacionados
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedCfdi {
    /// c_TipoRelacion
    pub relation_type: String,
    pub uuids: Vec<String>,
}

/// Fiscal fields written only by the lifecycle engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalData {
    pub state: FiscalState,
    pub stamping: Option<StampingResult>,
    pub cancellation: Option<CancellationRecord>,
    pub last_error: Option<LastError>,
}

impl FiscalData {
    pub fn uuid(&self) -> Option<&str> {
        self.stamping.as_ref().map(|s| s.uuid.as_str())
    }
}
