//! Pricing formulas for the market-making engine.
//!
//! Both strategies implement [`Formula`] so a market can switch between them
//! without changing how previews are computed.

pub mod balanced;
pub mod pluggable;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use balanced::BalancedReserves;
pub use pluggable::Pluggable;

/// Inputs shared by every formula.
///
/// `price` is only read by [`Pluggable`]: for `out_given_in` it is the
/// number of output units per input unit, for `in_given_out` the number of
/// input units per output unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaOpts {
    pub balance_in: u64,
    pub balance_out: u64,
    pub price: Decimal,
    /// Percentage fee in basis points.
    pub fee: u32,
    /// Charge the percentage fee on the input amount rather than the output.
    pub charge_fee_on_way_in: bool,
}

/// A conversion curve between the two assets of a market.
pub trait Formula {
    /// Instantaneous price implied by the options, as output per input.
    fn spot_price(&self, opts: &FormulaOpts) -> Result<Decimal>;

    /// Amount received for sending exactly `amount_in`.
    fn out_given_in(&self, opts: &FormulaOpts, amount_in: u64) -> Result<Decimal>;

    /// Amount to send for receiving exactly `amount_out`.
    fn in_given_out(&self, opts: &FormulaOpts, amount_out: u64) -> Result<Decimal>;
}
