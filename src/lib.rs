pub mod chain;
pub mod config;
pub mod error;
pub mod operator;
pub mod store;
pub mod trade_service;
pub mod utxo_lock;
pub mod watcher;

use std::sync::Arc;
use std::time::Duration;

use liquidex_core::SwapParser;

pub use config::DaemonConfig;
pub use error::{DaemonError, Result};
pub use operator::OperatorService;
pub use trade_service::{AcceptTrade, MarketBalances, TradeService};
pub use utxo_lock::{InMemoryUtxoLocker, UtxoLocker};
pub use watcher::{spawn_trade_watcher, WatcherEvent, WatcherHandle};

/// Install the `env_logger` backend. `RUST_LOG` takes precedence over
/// `filter`. Calling this more than once is harmless.
pub fn init_logging(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

// ============================================================================
// Daemon wiring
// ============================================================================

/// Operator and trade services sharing one set of repositories.
pub struct Daemon {
    pub config: DaemonConfig,
    pub operator: OperatorService,
    pub trades: Arc<TradeService>,
    pub locker: Arc<InMemoryUtxoLocker>,
}

impl Daemon {
    /// Wire the services over the in-memory store.
    pub fn in_memory(
        config: DaemonConfig,
        parser: Arc<dyn SwapParser>,
        balances: Arc<dyn MarketBalances>,
    ) -> Result<Self> {
        config.validate()?;
        let markets = Arc::new(store::InMemoryMarketRepository::new());
        let trades = Arc::new(store::InMemoryTradeRepository::new());
        let locker = Arc::new(InMemoryUtxoLocker::new());

        let operator = OperatorService::new(markets.clone(), config.default_percentage_fee);
        let trade_service = TradeService::new(
            parser,
            markets,
            trades,
            locker.clone(),
            balances,
            config.clone(),
        );
        log::info!("daemon: services ready");
        Ok(Self {
            config,
            operator,
            trades: Arc::new(trade_service),
            locker,
        })
    }

    /// Start the settlement/expiry watcher at the configured interval.
    pub fn start_watcher<C>(
        &self,
        chain: Arc<C>,
    ) -> (WatcherHandle, tokio::sync::mpsc::UnboundedReceiver<WatcherEvent>)
    where
        C: chain::ChainSource + Send + Sync + 'static,
    {
        spawn_trade_watcher(
            self.trades.clone(),
            chain,
            Duration::from_millis(self.config.watcher_interval_ms),
        )
    }
}
