//! Trade entity and its swap lifecycle.
//!
//! A trade moves `Undefined -> Proposal -> Accepted -> Completed -> Settled`,
//! or into `Expired` once its expiry time has passed. Counterparty data the
//! [`SwapParser`] rejects marks the trade as failed and is reported as
//! `Ok(false)`; only precondition violations return an [`Error`].

pub mod convert;
pub mod types;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::market::{FixedFee, MarketPrice, MarketSnapshot};
use crate::swap::{AcceptArgs, SwapFailCode, SwapParser, SwapRequest};

pub use convert::price_from_swap;
pub use types::{Swap, TradeStatus, TradeStatusCode};

/// Current wall-clock time in unix seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    id: String,
    market_name: String,
    market_base_asset: String,
    market_quote_asset: String,
    market_price: MarketPrice,
    market_percentage_fee: u32,
    market_fixed_fee: FixedFee,
    trader_pubkey: Vec<u8>,
    status: TradeStatus,
    pset_base64: String,
    tx_id: String,
    tx_hex: String,
    expiry_time: i64,
    settlement_time: i64,
    swap_request: Option<Swap>,
    swap_accept: Option<Swap>,
    swap_complete: Option<Swap>,
    swap_fail: Option<Swap>,
}

impl Trade {
    /// An empty trade in the `Undefined` state.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn market_name(&self) -> &str {
        &self.market_name
    }

    pub fn market_base_asset(&self) -> &str {
        &self.market_base_asset
    }

    pub fn market_quote_asset(&self) -> &str {
        &self.market_quote_asset
    }

    /// Price implied by the swap request amounts.
    pub fn market_price(&self) -> MarketPrice {
        self.market_price
    }

    pub fn market_percentage_fee(&self) -> u32 {
        self.market_percentage_fee
    }

    pub fn market_fixed_fee(&self) -> FixedFee {
        self.market_fixed_fee
    }

    pub fn trader_pubkey(&self) -> &[u8] {
        &self.trader_pubkey
    }

    pub fn status(&self) -> TradeStatus {
        self.status
    }

    pub fn pset_base64(&self) -> &str {
        &self.pset_base64
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn tx_hex(&self) -> &str {
        &self.tx_hex
    }

    /// Unix seconds, 0 when unset.
    pub fn expiry_time(&self) -> i64 {
        self.expiry_time
    }

    /// Block time of the settling transaction, 0 when unsettled.
    pub fn settlement_time(&self) -> i64 {
        self.settlement_time
    }

    pub fn swap_request(&self) -> Option<&Swap> {
        self.swap_request.as_ref()
    }

    pub fn swap_accept(&self) -> Option<&Swap> {
        self.swap_accept.as_ref()
    }

    pub fn swap_complete(&self) -> Option<&Swap> {
        self.swap_complete.as_ref()
    }

    pub fn swap_fail(&self) -> Option<&Swap> {
        self.swap_fail.as_ref()
    }

    pub fn is_proposal(&self) -> bool {
        self.status.code == TradeStatusCode::Proposal
    }

    pub fn is_accepted(&self) -> bool {
        self.status.code == TradeStatusCode::Accepted
    }

    pub fn is_completed(&self) -> bool {
        self.status.code == TradeStatusCode::Completed
    }

    pub fn is_settled(&self) -> bool {
        self.status.code == TradeStatusCode::Settled
    }

    pub fn is_rejected(&self) -> bool {
        self.status.failed
    }

    /// Explicitly expired, or past a set expiry time.
    pub fn is_expired(&self) -> bool {
        self.status.code == TradeStatusCode::Expired
            || (self.expiry_time > 0 && now() >= self.expiry_time)
    }

    /// Record the trader's request against a snapshot of the market terms.
    pub fn propose(
        &mut self,
        parser: &dyn SwapParser,
        request: &SwapRequest,
        market: &MarketSnapshot,
        trader_pubkey: &[u8],
    ) -> Result<bool> {
        if self.status.code >= TradeStatusCode::Proposal {
            return Ok(!self.status.failed);
        }

        self.market_name = market.name.clone();
        self.market_base_asset = market.base_asset.clone();
        self.market_quote_asset = market.quote_asset.clone();
        self.market_price = market.price;
        self.market_percentage_fee = market.percentage_fee;
        self.market_fixed_fee = market.fixed_fee;
        self.trader_pubkey = trader_pubkey.to_vec();
        self.status.code = TradeStatusCode::Proposal;

        let message = match parser.serialize_request(request) {
            Ok(message) => message,
            Err(e) => {
                self.fail(parser, &request.id, e.code, &e.message);
                return Ok(false);
            }
        };

        self.swap_request = Some(Swap {
            id: request.id.clone(),
            message,
            timestamp: now(),
        });
        self.market_price = price_from_swap(request, &market.quote_asset);
        self.pset_base64 = request.transaction.clone();
        Ok(true)
    }

    /// Answer the proposal with the maker-completed PSET.
    ///
    /// `expiry_time` is taken as given; the caller decides how long the
    /// counterparty has to complete.
    pub fn accept(
        &mut self,
        parser: &dyn SwapParser,
        pset_base64: &str,
        input_blinding_keys: &[Vec<u8>],
        output_blinding_keys: &[Vec<u8>],
        expiry_time: i64,
    ) -> Result<bool> {
        if self.status.code >= TradeStatusCode::Accepted {
            return Ok(!self.status.failed);
        }
        if self.status.code < TradeStatusCode::Proposal || self.status.failed {
            return Err(Error::TradeMustBeProposal(self.status.code));
        }
        let Some(request) = self.swap_request.clone() else {
            return Err(Error::TradeMustBeProposal(self.status.code));
        };

        let args = AcceptArgs {
            request_message: &request.message,
            transaction: pset_base64,
            input_blinding_keys,
            output_blinding_keys,
        };
        let (id, message) = match parser.serialize_accept(args) {
            Ok(accept) => accept,
            Err(e) => {
                self.fail(parser, &request.id, e.code, &e.message);
                return Ok(false);
            }
        };

        self.swap_accept = Some(Swap {
            id,
            message,
            timestamp: now(),
        });
        self.pset_base64 = pset_base64.to_string();
        self.expiry_time = expiry_time;
        self.status.code = TradeStatusCode::Accepted;
        Ok(true)
    }

    /// Take the counterparty's signed transaction.
    ///
    /// An expired trade is marked failed and returns [`Error::TradeExpired`]
    /// before any parsing happens.
    pub fn complete(&mut self, parser: &dyn SwapParser, transaction: &str) -> Result<bool> {
        match self.status.code {
            TradeStatusCode::Completed | TradeStatusCode::Settled => {
                return Ok(!self.status.failed);
            }
            TradeStatusCode::Expired => return Err(Error::TradeExpired),
            TradeStatusCode::Accepted if !self.status.failed => {}
            code => return Err(Error::TradeMustBeAccepted(code)),
        }
        let (Some(request), Some(accept)) = (self.swap_request.clone(), self.swap_accept.clone())
        else {
            return Err(Error::TradeMustBeAccepted(self.status.code));
        };

        if self.is_expired() {
            self.fail(parser, &accept.id, SwapFailCode::TradeExpired, "trade expired");
            return Err(Error::TradeExpired);
        }

        let details = match parser.parse_swap_transaction(transaction) {
            Ok(details) => details,
            Err(e) => {
                self.fail(parser, &accept.id, e.code, &e.message);
                return Ok(false);
            }
        };
        let (id, message) =
            match parser.serialize_complete(&request.message, &accept.message, transaction) {
                Ok(complete) => complete,
                Err(e) => {
                    self.fail(parser, &accept.id, e.code, &e.message);
                    return Ok(false);
                }
            };

        self.swap_complete = Some(Swap {
            id,
            message,
            timestamp: now(),
        });
        if !details.pset_base64.is_empty() {
            self.pset_base64 = details.pset_base64;
        }
        self.tx_id = details.txid;
        self.tx_hex = details.tx_hex;
        self.status.code = TradeStatusCode::Completed;
        Ok(true)
    }

    /// Mark the trade's transaction as confirmed at `settlement_time`.
    ///
    /// Accepted trades may settle directly when completion was observed on
    /// chain rather than through [`Trade::complete`], as long as they have
    /// not expired.
    pub fn settle(&mut self, settlement_time: i64) -> Result<bool> {
        match self.status.code {
            TradeStatusCode::Settled => return Ok(true),
            TradeStatusCode::Accepted | TradeStatusCode::Completed if !self.status.failed => {}
            code => return Err(Error::TradeMustBeCompletedOrAccepted(code)),
        }
        if self.is_accepted() && self.is_expired() {
            return Err(Error::TradeExpired);
        }

        self.settlement_time = settlement_time;
        self.expiry_time = 0;
        self.status.code = TradeStatusCode::Settled;
        Ok(true)
    }

    /// Reject the trade. Only the first call records a fail message; the
    /// status code is left untouched.
    pub fn fail(
        &mut self,
        parser: &dyn SwapParser,
        swap_id: &str,
        code: SwapFailCode,
        message: &str,
    ) {
        if self.status.failed {
            return;
        }
        self.status.failed = true;

        let (id, message) = parser.serialize_fail(swap_id, code, message);
        self.swap_fail = Some(Swap {
            id,
            message,
            timestamp: now(),
        });
    }

    pub fn expire(&mut self) -> Result<bool> {
        if self.status.code == TradeStatusCode::Expired {
            return Ok(true);
        }
        if self.expiry_time <= 0 {
            return Err(Error::NullExpiryTime);
        }
        if now() < self.expiry_time {
            return Err(Error::ExpiryTimeNotReached);
        }
        self.status.code = TradeStatusCode::Expired;
        Ok(true)
    }
}
