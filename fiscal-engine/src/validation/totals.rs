//! Line-level recomputation of invoice totals

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::LineItem;
use shared::money::{IVA_RATE, round2, round6};

/// Totals recomputed from line items
///
/// - `subtotal`: Σ gross line amounts (CFDI `SubTotal`)
/// - `discount`: Σ line discounts (CFDI `Descuento`)
/// - `tax_base`: `subtotal - discount`
/// - `tax`: Σ per-line IVA at 6 decimals, rounded to 2
/// - `total`: `subtotal - discount + tax`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_base: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// `None` when any amount or sum exceeds the `Decimal` range
    pub fn from_items(items: &[LineItem]) -> Option<Self> {
        let mut subtotal = Decimal::ZERO;
        let mut discount = Decimal::ZERO;
        let mut tax = Decimal::ZERO;
        for item in items {
            subtotal = subtotal.checked_add(item.checked_gross_amount()?)?;
            discount = discount.checked_add(item.checked_discount_amount()?)?;
            tax = tax.checked_add(checked_line_tax(item)?)?;
        }
        let tax = round2(tax);
        let tax_base = subtotal.checked_sub(discount)?;

        Some(Self {
            subtotal,
            discount,
            tax_base,
            tax,
            total: tax_base.checked_add(tax)?,
        })
    }
}

/// IVA transferred on one line, 6 decimals
pub fn line_tax(item: &LineItem) -> Decimal {
    round6(item.subtotal() * IVA_RATE)
}

fn checked_line_tax(item: &LineItem) -> Option<Decimal> {
    item.checked_subtotal()?.checked_mul(IVA_RATE).map(round6)
}
