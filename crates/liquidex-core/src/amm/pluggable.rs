use rust_decimal::Decimal;

use crate::amm::{Formula, FormulaOpts};
use crate::error::{Error, Result};
use crate::fee::{is_valid_percentage_fee, less_fee, plus_fee, round8};

/// Conversion at an externally fed price.
///
/// Balances only bound the output; they play no part in the price. The
/// spot price is always zero, callers read the market's stored price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pluggable;

impl Formula for Pluggable {
    fn spot_price(&self, _opts: &FormulaOpts) -> Result<Decimal> {
        Ok(Decimal::ZERO)
    }

    /// `amount_out = amount_in * price * (1 - fee)`
    fn out_given_in(&self, opts: &FormulaOpts, amount_in: u64) -> Result<Decimal> {
        if !is_valid_percentage_fee(opts.fee) {
            return Err(Error::InvalidPercentageFee(opts.fee));
        }
        if amount_in == 0 {
            return Err(Error::AmountTooLow);
        }

        let gross = Decimal::from(amount_in)
            .checked_mul(opts.price)
            .ok_or(Error::AmountTooBig)?;
        let amount_out = round8(less_fee(gross, opts.fee));

        if amount_out <= Decimal::ZERO {
            return Err(Error::AmountTooLow);
        }
        if amount_out >= Decimal::from(opts.balance_out) {
            return Err(Error::AmountTooBig);
        }
        Ok(amount_out)
    }

    /// `amount_in = amount_out * price * (1 + fee)`
    fn in_given_out(&self, opts: &FormulaOpts, amount_out: u64) -> Result<Decimal> {
        if amount_out >= opts.balance_out {
            return Err(Error::AmountTooBig);
        }
        if !is_valid_percentage_fee(opts.fee) {
            return Err(Error::InvalidPercentageFee(opts.fee));
        }
        if amount_out == 0 {
            return Err(Error::AmountTooLow);
        }

        let net = Decimal::from(amount_out)
            .checked_mul(opts.price)
            .ok_or(Error::AmountTooBig)?;
        let amount_in = round8(plus_fee(net, opts.fee));

        if amount_in <= Decimal::ZERO {
            return Err(Error::AmountTooLow);
        }
        Ok(amount_in)
    }
}
