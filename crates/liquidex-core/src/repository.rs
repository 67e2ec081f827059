//! Persistence contracts consumed by the daemon.
//!
//! Implementations must apply `update_*` closures atomically per key: the
//! closure sees the latest stored value and its changes are committed only
//! when it returns `Ok`. At most one mutation per market name or trade id
//! may be in flight.

use rust_decimal::Decimal;

use crate::error::Result;
use crate::market::Market;
use crate::trade::{Trade, TradeStatusCode};

/// 1-based page selector for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Index range covered by this page within `len` items.
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let size = self.size as usize;
        let start = (self.number.saturating_sub(1) as usize)
            .saturating_mul(size)
            .min(len);
        let end = start.saturating_add(size).min(len);
        start..end
    }
}

pub trait MarketRepository: Send + Sync {
    fn add_market(&self, market: Market) -> Result<()>;

    fn get_market_by_name(&self, name: &str) -> Result<Option<Market>>;

    fn get_market_by_assets(&self, base_asset: &str, quote_asset: &str)
    -> Result<Option<Market>>;

    fn get_all_markets(&self) -> Result<Vec<Market>>;

    fn get_tradable_markets(&self) -> Result<Vec<Market>>;

    /// Apply `f` to the stored market and return the committed value.
    fn update_market(
        &self,
        name: &str,
        f: &mut dyn FnMut(&mut Market) -> Result<()>,
    ) -> Result<Market>;

    fn open_market(&self, name: &str) -> Result<Market> {
        self.update_market(name, &mut |market| market.make_tradable())
    }

    fn close_market(&self, name: &str) -> Result<Market> {
        self.update_market(name, &mut |market| {
            market.make_not_tradable();
            Ok(())
        })
    }

    fn update_market_price(
        &self,
        name: &str,
        base_price: Decimal,
        quote_price: Decimal,
    ) -> Result<Market> {
        self.update_market(name, &mut |market| {
            market.change_price(base_price, quote_price)
        })
    }
}

pub trait TradeRepository: Send + Sync {
    fn add_trade(&self, trade: Trade) -> Result<()>;

    fn get_trade_by_id(&self, id: &str) -> Result<Option<Trade>>;

    fn get_trade_by_swap_accept_id(&self, swap_accept_id: &str) -> Result<Option<Trade>>;

    fn get_trade_by_tx_id(&self, tx_id: &str) -> Result<Option<Trade>>;

    /// All trades, oldest first, optionally paged.
    fn get_all_trades(&self, page: Option<Page>) -> Result<Vec<Trade>>;

    fn get_trades_by_market(&self, market_name: &str) -> Result<Vec<Trade>>;

    fn get_trades_by_status(&self, code: TradeStatusCode) -> Result<Vec<Trade>>;

    /// Apply `f` to the stored trade and return the committed value.
    fn update_trade(&self, id: &str, f: &mut dyn FnMut(&mut Trade) -> Result<()>)
    -> Result<Trade>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ranges() {
        let page = Page { number: 1, size: 10 };
        assert_eq!(page.range(25), 0..10);
        let page = Page { number: 3, size: 10 };
        assert_eq!(page.range(25), 20..25);
        let page = Page { number: 4, size: 10 };
        assert_eq!(page.range(25), 25..25);
        let page = Page { number: 0, size: 10 };
        assert_eq!(page.range(5), 0..5);
    }
}
