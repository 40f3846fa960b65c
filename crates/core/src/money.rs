//! Money helpers.
//!
//! Amounts, quantities and percentages are `Decimal`. Monetary values are kept
//! at two decimal places, rounding half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Smallest monetary unit accepted as a price (one cent).
pub const MIN_UNIT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Number of decimal places kept for money.
pub const MONEY_SCALE: u32 = 2;

/// Round a monetary value to two decimals (midpoint away from zero).
pub fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `percentage` percent of `value`, quantized.
pub fn percent_of(value: Decimal, percentage: Decimal) -> Decimal {
    quantize(value * percentage / Decimal::ONE_HUNDRED)
}
