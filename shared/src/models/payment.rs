//! Payment against a deferred-payment invoice and its complement (Pagos 2.0)

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fiscal::{LastError, StampingResult};

/// A registered payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    /// FechaPago
    pub paid_at: NaiveDateTime,
    pub amount: Decimal,
    /// c_FormaPago (FormaDePagoP)
    pub payment_form: String,
    /// Bank operation number (NumOperacion)
    pub operation_number: Option<String>,
    /// Present once the complement has been stamped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<PaymentComplement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
}

impl Payment {
    pub fn complement_uuid(&self) -> Option<&str> {
        self.complement.as_ref().map(|c| c.stamping.uuid.as_str())
    }
}

/// Figures of one payment applied to its origin invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplementFigures {
    /// NumParcialidad: prior payments on the invoice + 1
    pub partiality: u32,
    /// ImpSaldoAnt
    pub prior_balance: Decimal,
    /// ImpPagado
    pub amount: Decimal,
    /// ImpSaldoInsoluto
    pub remaining_balance: Decimal,
    /// Tax rate taken from the origin invoice
    pub tax_rate: Decimal,
    /// BaseDR
    pub tax_base: Decimal,
    /// ImporteDR
    pub tax_amount: Decimal,
}

/// A stamped payment complement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentComplement {
    pub figures: ComplementFigures,
    pub stamping: StampingResult,
}
