use thiserror::Error;

use crate::trade::TradeStatusCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid asset id {0:?}: must be a 32-byte hex string")]
    InvalidAsset(String),

    #[error("percentage fee must be in range [0, 9999], got {0}")]
    InvalidPercentageFee(u32),

    #[error("fixed fee must be non-negative and set for both assets")]
    InvalidFixedFee,

    #[error("market must be closed")]
    MarketMustBeClosed,

    #[error("market is closed")]
    MarketIsClosed,

    #[error("pluggable market cannot be opened without a price")]
    MarketNotPriced,

    #[error("market strategy is not pluggable")]
    MarketNotPluggable,

    #[error("base price must be greater than zero")]
    InvalidBasePrice,

    #[error("quote price must be greater than zero")]
    InvalidQuotePrice,

    #[error("amount is too low")]
    AmountTooLow,

    #[error("amount is too big")]
    AmountTooBig,

    #[error("balance is too low")]
    BalanceTooLow,

    #[error("trade must be in proposal state (found {0:?})")]
    TradeMustBeProposal(TradeStatusCode),

    #[error("trade must be in accepted state (found {0:?})")]
    TradeMustBeAccepted(TradeStatusCode),

    #[error("trade must be in completed or accepted state (found {0:?})")]
    TradeMustBeCompletedOrAccepted(TradeStatusCode),

    #[error("trade has expired")]
    TradeExpired,

    #[error("trade has no expiry time")]
    NullExpiryTime,

    #[error("trade expiry time not reached yet")]
    ExpiryTimeNotReached,

    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("market already exists: {0}")]
    MarketAlreadyExists(String),

    #[error("trade not found: {0}")]
    TradeNotFound(String),

    #[error("trade already exists: {0}")]
    TradeAlreadyExists(String),
}

pub type Result<T> = std::result::Result<T, Error>;
