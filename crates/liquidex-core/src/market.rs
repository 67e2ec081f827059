use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::amm::{BalancedReserves, Formula, FormulaOpts, Pluggable};
use crate::error::{Error, Result};
use crate::fee::{is_valid_percentage_fee, percentage_of, to_amount};

/// Passed to [`Market::change_fixed_fee`] to leave one side untouched.
pub const FIXED_FEE_UNCHANGED: i64 = -1;

/// Pricing strategy of a market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyType {
    /// Price follows the ratio of the market's reserves.
    #[default]
    Balanced,
    /// Price is fed from outside through [`Market::change_price`].
    Pluggable,
}

/// Flat fee charged per trade, denominated in each asset of the pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedFee {
    pub base_fee: u64,
    pub quote_fee: u64,
}

/// Price of a market in both orientations.
///
/// `base_price` is base units per quote unit, `quote_price` quote units per
/// base unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrice {
    pub base_price: Decimal,
    pub quote_price: Decimal,
}

impl MarketPrice {
    pub fn new(base_price: Decimal, quote_price: Decimal) -> Self {
        Self {
            base_price,
            quote_price,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.base_price.is_zero() || self.quote_price.is_zero()
    }
}

/// Result of [`Market::preview`]. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    pub price: MarketPrice,
    /// Converted amount of `asset`.
    pub amount: u64,
    pub asset: String,
    /// Asset the fees are denominated in: the one the trader named.
    pub fee_asset: String,
    /// Percentage plus fixed fee, in `fee_asset` units.
    pub fee_amount: u64,
}

/// Copy of the market terms a trade is proposed against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub name: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub percentage_fee: u32,
    pub fixed_fee: FixedFee,
    pub price: MarketPrice,
}

/// A trading pair the daemon makes a market for.
///
/// Fee, strategy and fixed-fee changes require the market to be closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    base_asset: String,
    quote_asset: String,
    name: String,
    percentage_fee: u32,
    fixed_fee: FixedFee,
    tradable: bool,
    strategy_type: StrategyType,
    price: MarketPrice,
}

/// Whether `asset` is a 32-byte hex string.
pub fn is_valid_asset(asset: &str) -> bool {
    asset.len() == 64 && hex::decode(asset).is_ok()
}

/// Short stable name for a pair: first 4 bytes of
/// `SHA256(base_asset || quote_asset)`, hex encoded.
pub fn market_name(base_asset: &str, quote_asset: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_asset.to_lowercase().as_bytes());
    hasher.update(quote_asset.to_lowercase().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}

impl Market {
    /// Create a closed, balanced market for the given pair.
    pub fn new(base_asset: &str, quote_asset: &str, percentage_fee: u32) -> Result<Self> {
        if !is_valid_asset(base_asset) {
            return Err(Error::InvalidAsset(base_asset.to_string()));
        }
        if !is_valid_asset(quote_asset) || quote_asset.eq_ignore_ascii_case(base_asset) {
            return Err(Error::InvalidAsset(quote_asset.to_string()));
        }
        if !is_valid_percentage_fee(percentage_fee) {
            return Err(Error::InvalidPercentageFee(percentage_fee));
        }

        Ok(Self {
            base_asset: base_asset.to_lowercase(),
            quote_asset: quote_asset.to_lowercase(),
            name: market_name(base_asset, quote_asset),
            percentage_fee,
            fixed_fee: FixedFee::default(),
            tradable: false,
            strategy_type: StrategyType::Balanced,
            price: MarketPrice::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_asset(&self) -> &str {
        &self.base_asset
    }

    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }

    pub fn percentage_fee(&self) -> u32 {
        self.percentage_fee
    }

    pub fn fixed_fee(&self) -> FixedFee {
        self.fixed_fee
    }

    pub fn price(&self) -> MarketPrice {
        self.price
    }

    pub fn strategy_type(&self) -> StrategyType {
        self.strategy_type
    }

    pub fn is_tradable(&self) -> bool {
        self.tradable
    }

    pub fn is_strategy_pluggable(&self) -> bool {
        self.strategy_type == StrategyType::Pluggable
    }

    /// Pluggable and already fed a non-zero price.
    pub fn is_strategy_pluggable_initialized(&self) -> bool {
        self.is_strategy_pluggable() && !self.price.is_zero()
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            name: self.name.clone(),
            base_asset: self.base_asset.clone(),
            quote_asset: self.quote_asset.clone(),
            percentage_fee: self.percentage_fee,
            fixed_fee: self.fixed_fee,
            price: self.price,
        }
    }

    pub fn make_tradable(&mut self) -> Result<()> {
        if self.is_strategy_pluggable() && self.price.is_zero() {
            return Err(Error::MarketNotPriced);
        }
        self.tradable = true;
        Ok(())
    }

    pub fn make_not_tradable(&mut self) {
        self.tradable = false;
    }

    /// Switch to an externally priced strategy. The price is reset and must
    /// be fed again before the market can be opened.
    pub fn make_strategy_pluggable(&mut self) -> Result<()> {
        self.ensure_closed()?;
        self.strategy_type = StrategyType::Pluggable;
        self.price = MarketPrice::default();
        Ok(())
    }

    pub fn make_strategy_balanced(&mut self) -> Result<()> {
        self.ensure_closed()?;
        self.strategy_type = StrategyType::Balanced;
        Ok(())
    }

    pub fn change_percentage_fee(&mut self, fee: u32) -> Result<()> {
        self.ensure_closed()?;
        if !is_valid_percentage_fee(fee) {
            return Err(Error::InvalidPercentageFee(fee));
        }
        self.percentage_fee = fee;
        Ok(())
    }

    /// Update the fixed fee. [`FIXED_FEE_UNCHANGED`] keeps the current value
    /// for that side; any other negative amount is rejected.
    pub fn change_fixed_fee(&mut self, base_fee: i64, quote_fee: i64) -> Result<()> {
        self.ensure_closed()?;

        let resolve = |requested: i64, current: u64| -> Result<u64> {
            match requested {
                FIXED_FEE_UNCHANGED => Ok(current),
                v if v < 0 => Err(Error::InvalidFixedFee),
                v => Ok(v as u64),
            }
        };
        if base_fee == FIXED_FEE_UNCHANGED && quote_fee == FIXED_FEE_UNCHANGED {
            return Err(Error::InvalidFixedFee);
        }

        let fixed_fee = FixedFee {
            base_fee: resolve(base_fee, self.fixed_fee.base_fee)?,
            quote_fee: resolve(quote_fee, self.fixed_fee.quote_fee)?,
        };
        self.fixed_fee = fixed_fee;
        Ok(())
    }

    /// Feed a new price to a pluggable market. Allowed while open.
    pub fn change_price(&mut self, base_price: Decimal, quote_price: Decimal) -> Result<()> {
        if !self.is_strategy_pluggable() {
            return Err(Error::MarketNotPluggable);
        }
        if base_price <= Decimal::ZERO {
            return Err(Error::InvalidBasePrice);
        }
        if quote_price <= Decimal::ZERO {
            return Err(Error::InvalidQuotePrice);
        }
        self.price = MarketPrice::new(base_price, quote_price);
        Ok(())
    }

    /// Current price: derived from the balances for a balanced market, the
    /// stored price for a pluggable one.
    pub fn spot_price(&self, base_balance: u64, quote_balance: u64) -> Result<MarketPrice> {
        match self.strategy_type {
            StrategyType::Pluggable => Ok(self.price),
            StrategyType::Balanced => {
                let base_per_quote = FormulaOpts {
                    balance_in: quote_balance,
                    balance_out: base_balance,
                    ..Default::default()
                };
                let quote_per_base = FormulaOpts {
                    balance_in: base_balance,
                    balance_out: quote_balance,
                    ..Default::default()
                };
                Ok(MarketPrice::new(
                    BalancedReserves.spot_price(&base_per_quote)?,
                    BalancedReserves.spot_price(&quote_per_base)?,
                ))
            }
        }
    }

    /// Quote a trade of `amount` units of the base asset (`is_base_asset`)
    /// or quote asset, buying (`is_buy`) or selling base.
    ///
    /// The converted amount is the conversion of the full `amount`; fees are
    /// reported in the asset the trader named. When the trader sends that
    /// asset the fee comes on top, when they receive it the fee is deducted
    /// and must leave something to receive. Never mutates the market.
    pub fn preview(
        &self,
        base_balance: u64,
        quote_balance: u64,
        amount: u64,
        is_base_asset: bool,
        is_buy: bool,
    ) -> Result<PreviewInfo> {
        if !self.tradable {
            return Err(Error::MarketIsClosed);
        }

        let fixed_fee = if is_base_asset {
            self.fixed_fee.base_fee
        } else {
            self.fixed_fee.quote_fee
        };
        if amount <= fixed_fee {
            return Err(Error::AmountTooLow);
        }

        let price = self.spot_price(base_balance, quote_balance)?;

        // Buying base with quote or selling base for quote means the trader
        // sends the named amount; otherwise they ask to receive it.
        let trader_sends_amount = is_buy != is_base_asset;
        let (amount_balance, other_balance) = if is_base_asset {
            (base_balance, quote_balance)
        } else {
            (quote_balance, base_balance)
        };
        let (amount_asset, other_asset) = if is_base_asset {
            (&self.base_asset, &self.quote_asset)
        } else {
            (&self.quote_asset, &self.base_asset)
        };

        let formula: &dyn Formula = match self.strategy_type {
            StrategyType::Balanced => &BalancedReserves,
            StrategyType::Pluggable => &Pluggable,
        };
        // Pluggable: other-asset units per named-asset unit, in both directions.
        let conversion_price = if is_base_asset {
            price.quote_price
        } else {
            price.base_price
        };

        // Fees are charged in the fee asset below, so the curve runs fee-free.
        let converted = if trader_sends_amount {
            let opts = FormulaOpts {
                balance_in: amount_balance,
                balance_out: other_balance,
                price: conversion_price,
                fee: 0,
                charge_fee_on_way_in: true,
            };
            formula.out_given_in(&opts, amount)?
        } else {
            let opts = FormulaOpts {
                balance_in: other_balance,
                balance_out: amount_balance,
                price: conversion_price,
                fee: 0,
                charge_fee_on_way_in: true,
            };
            formula.in_given_out(&opts, amount)?
        };
        let converted = to_amount(converted);
        if converted == 0 {
            return Err(Error::AmountTooLow);
        }

        let fee_amount = percentage_of(amount, self.percentage_fee)
            .checked_add(fixed_fee)
            .ok_or(Error::AmountTooBig)?;

        if trader_sends_amount {
            amount.checked_add(fee_amount).ok_or(Error::AmountTooBig)?;
        } else {
            if fee_amount >= amount {
                return Err(Error::AmountTooLow);
            }
            if amount - fee_amount >= amount_balance {
                return Err(Error::AmountTooBig);
            }
        }

        Ok(PreviewInfo {
            price,
            amount: converted,
            asset: other_asset.clone(),
            fee_asset: amount_asset.clone(),
            fee_amount,
        })
    }

    fn ensure_closed(&self) -> Result<()> {
        if self.tradable {
            return Err(Error::MarketMustBeClosed);
        }
        Ok(())
    }
}
