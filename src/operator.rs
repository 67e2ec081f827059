//! Market management for the daemon operator.

use std::sync::Arc;

use liquidex_core::{Error, Market, MarketRepository, StrategyType};
use rust_decimal::Decimal;

use crate::error::Result;

pub struct OperatorService {
    markets: Arc<dyn MarketRepository>,
    default_percentage_fee: u32,
}

impl OperatorService {
    pub fn new(markets: Arc<dyn MarketRepository>, default_percentage_fee: u32) -> Self {
        Self {
            markets,
            default_percentage_fee,
        }
    }

    /// Register a closed, balanced market charging the default fee.
    pub fn new_market(&self, base_asset: &str, quote_asset: &str) -> Result<Market> {
        let market = Market::new(base_asset, quote_asset, self.default_percentage_fee)?;
        self.markets.add_market(market.clone())?;
        log::info!(
            "operator: market {} created ({} / {})",
            market.name(),
            market.base_asset(),
            market.quote_asset()
        );
        Ok(market)
    }

    pub fn get_market(&self, name: &str) -> Result<Market> {
        self.markets
            .get_market_by_name(name)?
            .ok_or_else(|| Error::MarketNotFound(name.to_string()).into())
    }

    pub fn list_markets(&self) -> Result<Vec<Market>> {
        Ok(self.markets.get_all_markets()?)
    }

    pub fn open_market(&self, name: &str) -> Result<Market> {
        let market = self.markets.open_market(name)?;
        log::info!("operator: market {name} opened");
        Ok(market)
    }

    pub fn close_market(&self, name: &str) -> Result<Market> {
        let market = self.markets.close_market(name)?;
        log::info!("operator: market {name} closed");
        Ok(market)
    }

    pub fn update_percentage_fee(&self, name: &str, fee: u32) -> Result<Market> {
        let market = self
            .markets
            .update_market(name, &mut |market| market.change_percentage_fee(fee))?;
        log::info!("operator: market {name} percentage fee set to {fee} bp");
        Ok(market)
    }

    /// Pass [`liquidex_core::FIXED_FEE_UNCHANGED`] to keep one side as is.
    pub fn update_fixed_fee(&self, name: &str, base_fee: i64, quote_fee: i64) -> Result<Market> {
        let market = self.markets.update_market(name, &mut |market| {
            market.change_fixed_fee(base_fee, quote_fee)
        })?;
        let fixed = market.fixed_fee();
        log::info!(
            "operator: market {name} fixed fee set to {} base / {} quote",
            fixed.base_fee,
            fixed.quote_fee
        );
        Ok(market)
    }

    pub fn update_market_price(
        &self,
        name: &str,
        base_price: Decimal,
        quote_price: Decimal,
    ) -> Result<Market> {
        let market = self
            .markets
            .update_market_price(name, base_price, quote_price)?;
        log::debug!("operator: market {name} price {base_price} / {quote_price}");
        Ok(market)
    }

    pub fn update_market_strategy(&self, name: &str, strategy: StrategyType) -> Result<Market> {
        let market = self.markets.update_market(name, &mut |market| match strategy {
            StrategyType::Balanced => market.make_strategy_balanced(),
            StrategyType::Pluggable => market.make_strategy_pluggable(),
        })?;
        log::info!("operator: market {name} strategy set to {strategy:?}");
        Ok(market)
    }
}
