//! In-memory repositories.
//!
//! Each table sits behind one mutex, so an `update_*` closure runs while no
//! other mutation of the same table can interleave. The closure works on a
//! copy that replaces the stored value only when it returns `Ok`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use liquidex_core::{
    Error, Market, MarketRepository, Page, Result, Trade, TradeRepository, TradeStatusCode,
};

use crate::error::DaemonError;
use crate::trade_service::MarketBalances;

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Rows keyed by id, iterated in insertion order.
struct Table<T> {
    rows: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert(&mut self, key: String, row: T) {
        self.order.push(key.clone());
        self.rows.insert(key, row);
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|k| self.rows.get(k))
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.iter().find(|row| pred(row)).cloned()
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.iter().filter(|row| pred(row)).cloned().collect()
    }
}

// ── Markets ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryMarketRepository {
    table: Mutex<Table<Market>>,
}

impl InMemoryMarketRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarketRepository for InMemoryMarketRepository {
    fn add_market(&self, market: Market) -> Result<()> {
        let mut table = guard(&self.table);
        if table.rows.contains_key(market.name()) {
            return Err(Error::MarketAlreadyExists(market.name().to_string()));
        }
        table.insert(market.name().to_string(), market);
        Ok(())
    }

    fn get_market_by_name(&self, name: &str) -> Result<Option<Market>> {
        Ok(guard(&self.table).rows.get(name).cloned())
    }

    fn get_market_by_assets(
        &self,
        base_asset: &str,
        quote_asset: &str,
    ) -> Result<Option<Market>> {
        Ok(guard(&self.table).find(|m| {
            m.base_asset().eq_ignore_ascii_case(base_asset)
                && m.quote_asset().eq_ignore_ascii_case(quote_asset)
        }))
    }

    fn get_all_markets(&self) -> Result<Vec<Market>> {
        Ok(guard(&self.table).filter(|_| true))
    }

    fn get_tradable_markets(&self) -> Result<Vec<Market>> {
        Ok(guard(&self.table).filter(Market::is_tradable))
    }

    fn update_market(
        &self,
        name: &str,
        f: &mut dyn FnMut(&mut Market) -> Result<()>,
    ) -> Result<Market> {
        let mut table = guard(&self.table);
        let stored = table
            .rows
            .get_mut(name)
            .ok_or_else(|| Error::MarketNotFound(name.to_string()))?;
        let mut market = stored.clone();
        f(&mut market)?;
        *stored = market.clone();
        Ok(market)
    }
}

// ── Trades ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTradeRepository {
    table: Mutex<Table<Trade>>,
}

impl InMemoryTradeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TradeRepository for InMemoryTradeRepository {
    fn add_trade(&self, trade: Trade) -> Result<()> {
        let mut table = guard(&self.table);
        if table.rows.contains_key(trade.id()) {
            return Err(Error::TradeAlreadyExists(trade.id().to_string()));
        }
        table.insert(trade.id().to_string(), trade);
        Ok(())
    }

    fn get_trade_by_id(&self, id: &str) -> Result<Option<Trade>> {
        Ok(guard(&self.table).rows.get(id).cloned())
    }

    fn get_trade_by_swap_accept_id(&self, swap_accept_id: &str) -> Result<Option<Trade>> {
        Ok(guard(&self.table)
            .find(|t| t.swap_accept().is_some_and(|s| s.id == swap_accept_id)))
    }

    fn get_trade_by_tx_id(&self, tx_id: &str) -> Result<Option<Trade>> {
        Ok(guard(&self.table).find(|t| !t.tx_id().is_empty() && t.tx_id() == tx_id))
    }

    fn get_all_trades(&self, page: Option<Page>) -> Result<Vec<Trade>> {
        let all = guard(&self.table).filter(|_| true);
        Ok(match page {
            Some(page) => {
                let range = page.range(all.len());
                all[range].to_vec()
            }
            None => all,
        })
    }

    fn get_trades_by_market(&self, market_name: &str) -> Result<Vec<Trade>> {
        Ok(guard(&self.table).filter(|t| t.market_name() == market_name))
    }

    fn get_trades_by_status(&self, code: TradeStatusCode) -> Result<Vec<Trade>> {
        Ok(guard(&self.table).filter(|t| t.status().code == code))
    }

    fn update_trade(
        &self,
        id: &str,
        f: &mut dyn FnMut(&mut Trade) -> Result<()>,
    ) -> Result<Trade> {
        let mut table = guard(&self.table);
        let stored = table
            .rows
            .get_mut(id)
            .ok_or_else(|| Error::TradeNotFound(id.to_string()))?;
        let mut trade = stored.clone();
        f(&mut trade)?;
        *stored = trade.clone();
        Ok(trade)
    }
}

// ── Balances ────────────────────────────────────────────────────────

/// Fixed `(base, quote)` balances per market name.
#[derive(Default)]
pub struct StaticBalances {
    balances: Mutex<HashMap<String, (u64, u64)>>,
}

impl StaticBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, market_name: &str, base_balance: u64, quote_balance: u64) {
        guard(&self.balances).insert(market_name.to_string(), (base_balance, quote_balance));
    }
}

impl MarketBalances for StaticBalances {
    fn balances(&self, market: &Market) -> crate::error::Result<(u64, u64)> {
        guard(&self.balances)
            .get(market.name())
            .copied()
            .ok_or_else(|| DaemonError::Balances(format!("no balances for {}", market.name())))
    }
}
