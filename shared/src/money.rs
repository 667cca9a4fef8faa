//! Decimal money helpers
//!
//! All fiscal arithmetic is done with `rust_decimal::Decimal`. CFDI fixes the
//! number of decimals per attribute, so formatting lives here too:
//! - comprobante totals and concept amounts: 2 decimals
//! - concept-level tax detail (`Base`, `Importe`): 6 decimals
//! - quantities: up to 6 decimals, trailing zeros removed

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Tolerance for comparing declared totals with recomputed ones (one cent)
pub const MONEY_TOLERANCE: Decimal = dec!(0.01);

/// Domestic IVA rate
pub const IVA_RATE: Decimal = dec!(0.16);

/// Round to 2 decimals, half away from zero
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to 6 decimals, half away from zero
#[inline]
pub fn round6(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether two amounts are equal within [`MONEY_TOLERANCE`]
#[inline]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b)
        .is_some_and(|diff| diff.abs() <= MONEY_TOLERANCE)
}

/// Format with exactly 2 decimals (`1160.00`)
pub fn fmt2(value: Decimal) -> String {
    fixed(round2(value), 2)
}

/// Format with exactly 6 decimals (`160.000000`)
pub fn fmt6(value: Decimal) -> String {
    fixed(round6(value), 6)
}

/// Format a quantity: at most 6 decimals, no trailing zeros (`1`, `2.5`)
pub fn fmt_quantity(value: Decimal) -> String {
    round6(value).normalize().to_string()
}

/// Format a unit price: at least 2 and at most 6 decimals
pub fn fmt_unit_price(value: Decimal) -> String {
    let normalized = round6(value).normalize();
    if normalized.scale() < 2 {
        fixed(normalized, 2)
    } else {
        normalized.to_string()
    }
}

fn fixed(mut value: Decimal, scale: u32) -> String {
    value.rescale(scale);
    value.to_string()
}
