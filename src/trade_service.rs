//! Trade orchestration: runs the core lifecycle against the repositories and
//! keeps wallet UTXOs locked for as long as a trade may still spend them.
//!
//! Every lifecycle step goes through `TradeRepository::update_trade`, so the
//! trade is read, transitioned and written back as one unit. Soft rejections
//! by the swap parser are persisted with the trade's `failed` flag set and
//! returned as `Ok`; callers inspect [`Trade::is_rejected`].

use std::sync::Arc;

use liquidex_core::fee::BASIS_POINT_DENOM;
use liquidex_core::trade::now;
use liquidex_core::{
    Error, Market, MarketRepository, Page, PreviewInfo, SwapFailCode, SwapParser, SwapRequest,
    Trade, TradeRepository, TradeStatusCode,
};

use crate::chain::ChainSource;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, Result};
use crate::utxo_lock::UtxoLocker;

/// Current `(base, quote)` balances the daemon holds for a market.
pub trait MarketBalances: Send + Sync {
    fn balances(&self, market: &Market) -> Result<(u64, u64)>;
}

/// Maker side of a swap accept.
#[derive(Debug, Clone, Default)]
pub struct AcceptTrade {
    pub trade_id: String,
    /// PSET with the maker's inputs and outputs added.
    pub pset_base64: String,
    pub input_blinding_keys: Vec<Vec<u8>>,
    pub output_blinding_keys: Vec<Vec<u8>>,
    /// Outpoints (`txid:vout`) of the maker inputs added to the PSET.
    pub utxos: Vec<String>,
}

pub struct TradeService {
    parser: Arc<dyn SwapParser>,
    markets: Arc<dyn MarketRepository>,
    trades: Arc<dyn TradeRepository>,
    locker: Arc<dyn UtxoLocker>,
    balances: Arc<dyn MarketBalances>,
    config: DaemonConfig,
}

impl TradeService {
    pub fn new(
        parser: Arc<dyn SwapParser>,
        markets: Arc<dyn MarketRepository>,
        trades: Arc<dyn TradeRepository>,
        locker: Arc<dyn UtxoLocker>,
        balances: Arc<dyn MarketBalances>,
        config: DaemonConfig,
    ) -> Self {
        Self {
            parser,
            markets,
            trades,
            locker,
            balances,
            config,
        }
    }

    fn market(&self, name: &str) -> Result<Market> {
        self.markets
            .get_market_by_name(name)?
            .ok_or_else(|| Error::MarketNotFound(name.to_string()).into())
    }

    pub fn get_trade(&self, id: &str) -> Result<Trade> {
        self.trades
            .get_trade_by_id(id)?
            .ok_or_else(|| Error::TradeNotFound(id.to_string()).into())
    }

    pub fn list_trades(&self, page: Option<Page>) -> Result<Vec<Trade>> {
        Ok(self.trades.get_all_trades(page)?)
    }

    /// Quote `amount` of the base (or quote) asset on `market_name` at the
    /// current balances.
    pub fn preview(
        &self,
        market_name: &str,
        amount: u64,
        is_base_asset: bool,
        is_buy: bool,
    ) -> Result<PreviewInfo> {
        let market = self.market(market_name)?;
        let (base_balance, quote_balance) = self.balances.balances(&market)?;
        Ok(market.preview(base_balance, quote_balance, amount, is_base_asset, is_buy)?)
    }

    /// Why the amounts of `request` are unacceptable at the current
    /// balances, if they are.
    ///
    /// The amount sent is taken to include the fee charged on top of it. The
    /// amount asked for may deviate from the preview of the net amount by at
    /// most `price_slippage` basis points either way.
    fn price_mismatch(&self, market: &Market, request: &SwapRequest) -> Result<Option<String>> {
        let (base_balance, quote_balance) = self.balances.balances(market)?;
        let sends_base = request.asset_p.eq_ignore_ascii_case(market.base_asset());
        let fixed = market.fixed_fee();
        let fixed_fee = if sends_base {
            fixed.base_fee
        } else {
            fixed.quote_fee
        };

        let denom = u128::from(BASIS_POINT_DENOM);
        let net = u128::from(request.amount_p.saturating_sub(fixed_fee)) * denom
            / (denom + u128::from(market.percentage_fee()));
        let net = u64::try_from(net).unwrap_or(u64::MAX);

        let preview =
            match market.preview(base_balance, quote_balance, net, sends_base, !sends_base) {
                Ok(preview) => preview,
                Err(e) => return Ok(Some(format!("amounts not tradable: {e}"))),
            };

        let expected = u128::from(preview.amount);
        let deviation = u128::from(request.amount_r).abs_diff(expected);
        if deviation * denom > expected * u128::from(self.config.price_slippage) {
            return Ok(Some(format!(
                "amount {} deviates from expected {} by more than {} bp",
                request.amount_r, expected, self.config.price_slippage
            )));
        }
        Ok(None)
    }

    /// Open a new trade for `request` on the market trading its two assets.
    ///
    /// The trade is stored even when it is rejected, either by the parser or
    /// because its amounts are off the market price.
    pub fn propose_trade(&self, request: &SwapRequest, trader_pubkey: &[u8]) -> Result<Trade> {
        let market = match self
            .markets
            .get_market_by_assets(&request.asset_r, &request.asset_p)?
        {
            Some(market) => market,
            None => self
                .markets
                .get_market_by_assets(&request.asset_p, &request.asset_r)?
                .ok_or_else(|| {
                    Error::MarketNotFound(format!("{}/{}", request.asset_p, request.asset_r))
                })?,
        };
        if !market.is_tradable() {
            return Err(Error::MarketIsClosed.into());
        }

        let mut trade = Trade::new(uuid::Uuid::new_v4().to_string());
        let ok = trade.propose(
            self.parser.as_ref(),
            request,
            &market.snapshot(),
            trader_pubkey,
        )?;
        if ok {
            if let Some(reason) = self.price_mismatch(&market, request)? {
                log::warn!(
                    "trade_service: trade {} off price on market {}: {reason}",
                    trade.id(),
                    market.name()
                );
                trade.fail(
                    self.parser.as_ref(),
                    &request.id,
                    SwapFailCode::InvalidSwapRequest,
                    &reason,
                );
            }
        }
        self.trades.add_trade(trade.clone())?;

        if trade.is_rejected() {
            log::warn!(
                "trade_service: trade {} rejected at proposal (request {})",
                trade.id(),
                request.id
            );
        } else {
            log::info!(
                "trade_service: trade {} proposed on market {}",
                trade.id(),
                market.name()
            );
        }
        Ok(trade)
    }

    /// Accept a proposal and lock the maker UTXOs it spends.
    ///
    /// Locks are taken before the trade moves to `Accepted`. If another trade
    /// holds one of them, the keys taken so far are released, a pending
    /// proposal is failed and [`DaemonError::AlreadyLocked`] is returned.
    /// When a concurrent call accepted the trade first, the keys this call
    /// took are released again.
    pub fn accept_trade(&self, args: &AcceptTrade) -> Result<Trade> {
        let current = self.get_trade(&args.trade_id)?;
        if current.status().code >= TradeStatusCode::Accepted {
            return Ok(current);
        }

        let mut taken = Vec::new();
        for key in &args.utxos {
            match self.locker.lock(key, &args.trade_id) {
                Ok(true) => taken.push(key.clone()),
                Ok(false) => {}
                Err(e) => {
                    self.release(&taken);
                    log::warn!("trade_service: trade {} lock conflict: {e}", args.trade_id);
                    let message = e.to_string();
                    let trade = self.trades.update_trade(&args.trade_id, &mut |trade| {
                        if trade.is_proposal() {
                            let reply_to = trade
                                .swap_request()
                                .map(|s| s.id.clone())
                                .unwrap_or_default();
                            trade.fail(
                                self.parser.as_ref(),
                                &reply_to,
                                SwapFailCode::Aborted,
                                &message,
                            );
                        }
                        Ok(())
                    })?;
                    if trade.is_rejected() {
                        self.locker.unlock_all(&args.trade_id);
                    }
                    return Err(e);
                }
            }
        }

        let expiry_time = now().saturating_add(self.config.trade_expiry());
        let mut transitioned = false;
        let result = self.trades.update_trade(&args.trade_id, &mut |trade| {
            let before = trade.status().code;
            let ok = trade.accept(
                self.parser.as_ref(),
                &args.pset_base64,
                &args.input_blinding_keys,
                &args.output_blinding_keys,
                expiry_time,
            )?;
            transitioned = ok && before < TradeStatusCode::Accepted;
            Ok(())
        });

        let trade = match result {
            Ok(trade) => trade,
            Err(e) => {
                self.release(&taken);
                return Err(e.into());
            }
        };
        if transitioned {
            log::info!(
                "trade_service: trade {} accepted, expires at {}",
                trade.id(),
                trade.expiry_time()
            );
        } else if trade.is_rejected() {
            self.locker.unlock_all(&args.trade_id);
            log::warn!("trade_service: trade {} rejected at accept", trade.id());
        } else {
            self.release(&taken);
            log::debug!(
                "trade_service: trade {} already accepted, {} utxos released",
                trade.id(),
                taken.len()
            );
        }
        Ok(trade)
    }

    fn release(&self, keys: &[String]) {
        for key in keys {
            self.locker.unlock(key);
        }
    }

    /// Take the counterparty's signed transaction for the accept it answers.
    ///
    /// An expired trade is stored as failed, its locks released, and
    /// [`Error::TradeExpired`] is returned.
    pub fn complete_trade(&self, swap_accept_id: &str, transaction: &str) -> Result<Trade> {
        let trade_id = self
            .trades
            .get_trade_by_swap_accept_id(swap_accept_id)?
            .ok_or_else(|| Error::TradeNotFound(swap_accept_id.to_string()))?
            .id()
            .to_string();

        let mut expired = false;
        let trade = self.trades.update_trade(&trade_id, &mut |trade| {
            match trade.complete(self.parser.as_ref(), transaction) {
                Ok(_) => Ok(()),
                // Keep the failed flag set by an expired completion.
                Err(Error::TradeExpired) => {
                    expired = true;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        })?;

        if trade.is_rejected() {
            self.locker.unlock_all(&trade_id);
        }
        if expired {
            log::warn!("trade_service: trade {trade_id} completed after expiry");
            return Err(Error::TradeExpired.into());
        }
        if trade.is_rejected() {
            log::warn!("trade_service: trade {trade_id} rejected at completion");
        } else {
            log::info!(
                "trade_service: trade {trade_id} completed, txid {}",
                trade.tx_id()
            );
        }
        Ok(trade)
    }

    pub fn settle_trade(&self, trade_id: &str, settlement_time: i64) -> Result<Trade> {
        let trade = self.trades.update_trade(trade_id, &mut |trade| {
            trade.settle(settlement_time).map(|_| ())
        })?;
        let released = self.locker.unlock_all(trade_id);
        log::info!("trade_service: trade {trade_id} settled, {released} utxos released");
        Ok(trade)
    }

    /// Reject a trade on the operator's behalf, replying to its latest swap
    /// message.
    pub fn fail_trade(&self, trade_id: &str, code: SwapFailCode, message: &str) -> Result<Trade> {
        let trade = self.trades.update_trade(trade_id, &mut |trade| {
            let reply_to = trade
                .swap_complete()
                .or(trade.swap_accept())
                .or(trade.swap_request())
                .map(|s| s.id.clone())
                .unwrap_or_default();
            trade.fail(self.parser.as_ref(), &reply_to, code, message);
            Ok(())
        })?;
        let released = self.locker.unlock_all(trade_id);
        log::warn!("trade_service: trade {trade_id} failed ({message}), {released} utxos released");
        Ok(trade)
    }

    /// Move every accepted or completed trade past its expiry time to
    /// `Expired` and release its UTXOs.
    pub fn expire_trades(&self) -> Result<Vec<Trade>> {
        self.expire_in(&[TradeStatusCode::Accepted, TradeStatusCode::Completed])
    }

    /// Like [`TradeService::expire_trades`], leaving completed trades alone.
    /// Used while the chain cannot tell whether their transaction confirmed.
    pub fn expire_accepted_trades(&self) -> Result<Vec<Trade>> {
        self.expire_in(&[TradeStatusCode::Accepted])
    }

    fn expire_in(&self, codes: &[TradeStatusCode]) -> Result<Vec<Trade>> {
        let current = now();
        let mut expired = Vec::new();
        for &code in codes {
            for trade in self.trades.get_trades_by_status(code)? {
                if trade.expiry_time() <= 0 || current < trade.expiry_time() {
                    continue;
                }
                match self
                    .trades
                    .update_trade(trade.id(), &mut |trade| trade.expire().map(|_| ()))
                {
                    Ok(trade) => {
                        self.locker.unlock_all(trade.id());
                        log::info!("trade_service: trade {} expired", trade.id());
                        expired.push(trade);
                    }
                    Err(e) => log::debug!("trade_service: trade {} not expired: {e}", trade.id()),
                }
            }
        }
        Ok(expired)
    }

    /// Settle completed trades whose transaction `chain` reports confirmed.
    pub fn settle_confirmed_trades<C: ChainSource + ?Sized>(&self, chain: &C) -> Result<Vec<Trade>> {
        let mut settled = Vec::new();
        for trade in self.trades.get_trades_by_status(TradeStatusCode::Completed)? {
            if trade.is_rejected() || trade.tx_id().is_empty() {
                continue;
            }
            let confirmed = chain
                .confirmation_time(trade.tx_id())
                .map_err(|e| DaemonError::Chain(e.to_string()))?;
            if let Some(block_time) = confirmed {
                settled.push(self.settle_trade(trade.id(), block_time)?);
            }
        }
        Ok(settled)
    }
}
