//! Trusted core of a Liquid asset-exchange daemon: AMM pricing, markets and
//! the atomic-swap trade lifecycle.
//!
//! Everything here is synchronous and free of I/O. Persistence, UTXO
//! locking and the swap message codec are supplied by the caller.

pub mod amm;
pub mod error;
pub mod fee;
pub mod market;
pub mod repository;
pub mod swap;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trade;

pub use rust_decimal::Decimal;

pub use amm::{BalancedReserves, Formula, FormulaOpts, Pluggable};
pub use error::{Error, Result};
pub use market::{
    FIXED_FEE_UNCHANGED, FixedFee, Market, MarketPrice, MarketSnapshot, PreviewInfo,
    StrategyType, is_valid_asset, market_name,
};
pub use repository::{MarketRepository, Page, TradeRepository};
pub use swap::{
    AcceptArgs, SwapAccept, SwapComplete, SwapError, SwapFail, SwapFailCode, SwapParser,
    SwapRequest, TransactionDetails,
};
pub use trade::{Swap, Trade, TradeStatus, TradeStatusCode, price_from_swap};
