//! Basis-point and fixed-precision helpers shared by the pricing formulas.
//!
//! Amounts on Liquid are integer satoshi-like units; intermediate math runs
//! on [`Decimal`] and results are rounded to [`PRECISION`] decimal places.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Basis point denominator (1 bp = 1/10000).
pub const BASIS_POINT_DENOM: u32 = 10_000;

/// Largest accepted percentage fee (99.99%).
pub const MAX_PERCENTAGE_FEE: u32 = 9_999;

/// Number of decimal places kept by formula results and prices.
pub const PRECISION: u32 = 8;

/// Whether `fee` is a valid percentage fee in basis points.
pub fn is_valid_percentage_fee(fee: u32) -> bool {
    fee <= MAX_PERCENTAGE_FEE
}

/// The fee as a fraction, e.g. 25 bp -> 0.0025.
pub fn fee_fraction(fee: u32) -> Decimal {
    Decimal::from(fee) / Decimal::from(BASIS_POINT_DENOM)
}

/// `amount * (1 - fee)`.
pub fn less_fee(amount: Decimal, fee: u32) -> Decimal {
    amount * (Decimal::ONE - fee_fraction(fee))
}

/// `amount * (1 + fee)`.
pub fn plus_fee(amount: Decimal, fee: u32) -> Decimal {
    amount * (Decimal::ONE + fee_fraction(fee))
}

/// Percentage fee owed on an integer amount, floored.
pub fn percentage_of(amount: u64, fee: u32) -> u64 {
    ((amount as u128) * (fee as u128) / (BASIS_POINT_DENOM as u128)) as u64
}

/// Round to [`PRECISION`] places, midpoints away from zero.
pub fn round8(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncate to [`PRECISION`] places.
pub fn truncate8(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRECISION, RoundingStrategy::ToZero)
}

/// Integer part of a non-negative decimal amount. Negative values map to 0.
pub fn to_amount(value: Decimal) -> u64 {
    if value.is_sign_negative() {
        return 0;
    }
    value.floor().to_u64().unwrap_or(u64::MAX)
}
