//! Invoice line item (Concepto)

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::money::round2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    /// Internal product reference (NoIdentificacion)
    pub product_id: Option<String>,
    /// c_ClaveProdServ
    pub sat_product_code: String,
    /// c_ClaveUnidad
    pub sat_unit_code: String,
    /// Free-text unit name (Unidad)
    pub unit_name: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Discount percentage in [0, 100]
    #[serde(default)]
    pub discount_percent: Decimal,
}

impl LineItem {
    /// quantity × unit price, rounded to cents (Importe)
    ///
    /// Panics on overflow; use [`LineItem::checked_gross_amount`] on
    /// unvalidated data.
    pub fn gross_amount(&self) -> Decimal {
        round2(self.quantity * self.unit_price)
    }

    /// Discount amount, rounded to cents (Descuento)
    pub fn discount_amount(&self) -> Decimal {
        round2(self.gross_amount() * self.discount_percent / dec!(100))
    }

    /// quantity × unit price × (1 − discount%)
    pub fn subtotal(&self) -> Decimal {
        self.gross_amount() - self.discount_amount()
    }

    /// `None` when the product exceeds the `Decimal` range
    pub fn checked_gross_amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price).map(round2)
    }

    pub fn checked_discount_amount(&self) -> Option<Decimal> {
        self.checked_gross_amount()?
            .checked_mul(self.discount_percent)?
            .checked_div(dec!(100))
            .map(round2)
    }

    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.checked_gross_amount()?
            .checked_sub(self.checked_discount_amount()?)
    }
}
