use rust_decimal::Decimal;

use crate::amm::{Formula, FormulaOpts};
use crate::error::{Error, Result};
use crate::fee::{is_valid_percentage_fee, less_fee, plus_fee, round8};

/// Constant-reserve curve over two balances, 50/50 weighted.
///
/// The product of the balances is preserved by every trade, so the price
/// moves against the trader as the output reserve drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalancedReserves;

fn check_balances(opts: &FormulaOpts) -> Result<()> {
    if opts.balance_in == 0 || opts.balance_out == 0 {
        return Err(Error::BalanceTooLow);
    }
    Ok(())
}

fn check_fee(fee: u32) -> Result<()> {
    if !is_valid_percentage_fee(fee) {
        return Err(Error::InvalidPercentageFee(fee));
    }
    Ok(())
}

impl Formula for BalancedReserves {
    /// `balance_out / balance_in`.
    fn spot_price(&self, opts: &FormulaOpts) -> Result<Decimal> {
        check_balances(opts)?;
        let price = Decimal::from(opts.balance_out) / Decimal::from(opts.balance_in);
        Ok(round8(price))
    }

    /// `amount_out = balance_out * (1 - balance_in / (balance_in + amount_in))`
    ///
    /// The fee reduces `amount_in` before the curve when charged on the way
    /// in, otherwise it reduces the curve output.
    fn out_given_in(&self, opts: &FormulaOpts, amount_in: u64) -> Result<Decimal> {
        check_balances(opts)?;
        check_fee(opts.fee)?;

        let balance_in = Decimal::from(opts.balance_in);
        let balance_out = Decimal::from(opts.balance_out);

        let mut amount = Decimal::from(amount_in);
        if opts.charge_fee_on_way_in {
            amount = less_fee(amount, opts.fee);
        }
        if amount <= Decimal::ZERO {
            return Err(Error::AmountTooLow);
        }

        let ratio = balance_in / (balance_in + amount);
        let mut amount_out = balance_out * (Decimal::ONE - ratio);
        if !opts.charge_fee_on_way_in {
            amount_out = less_fee(amount_out, opts.fee);
        }
        let amount_out = round8(amount_out);

        if amount_out <= Decimal::ZERO {
            return Err(Error::AmountTooLow);
        }
        if amount_out >= balance_out {
            return Err(Error::AmountTooBig);
        }
        Ok(amount_out)
    }

    /// `amount_in = balance_in * (balance_out / (balance_out - amount_out) - 1)`
    ///
    /// With the fee charged on the way in the resulting input is increased by
    /// the fee; otherwise the requested output is grossed up before the curve.
    fn in_given_out(&self, opts: &FormulaOpts, amount_out: u64) -> Result<Decimal> {
        if amount_out >= opts.balance_out {
            return Err(Error::AmountTooBig);
        }
        check_balances(opts)?;
        check_fee(opts.fee)?;
        if amount_out == 0 {
            return Err(Error::AmountTooLow);
        }

        let balance_in = Decimal::from(opts.balance_in);
        let balance_out = Decimal::from(opts.balance_out);

        let mut amount = Decimal::from(amount_out);
        if !opts.charge_fee_on_way_in {
            amount = plus_fee(amount, opts.fee);
            if amount >= balance_out {
                return Err(Error::AmountTooBig);
            }
        }

        let ratio = balance_out / (balance_out - amount);
        let mut amount_in = balance_in * (ratio - Decimal::ONE);
        if opts.charge_fee_on_way_in {
            amount_in = plus_fee(amount_in, opts.fee);
        }
        let amount_in = round8(amount_in);

        if amount_in <= Decimal::ZERO {
            return Err(Error::AmountTooLow);
        }
        Ok(amount_in)
    }
}
