//! `TradeWatcher`: periodic settlement and expiry sweep.
//!
//! Runs as a tokio task next to the daemon's request handling. Each tick
//! first settles completed trades the chain reports confirmed, then expires
//! whatever is left past its expiry time. Completed trades are not expired
//! on a tick where the chain could not be queried.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;

use crate::chain::ChainSource;
use crate::trade_service::TradeService;

// ── Public types ────────────────────────────────────────────────────

#[derive(Debug)]
enum WatchCmd {
    Sweep,
    Shutdown,
}

/// Events emitted by the watcher task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    TradeSettled { trade_id: String },
    TradeExpired { trade_id: String },
    SweepFailed { error: String },
}

/// Handle for a running watcher task.
#[derive(Clone)]
pub struct WatcherHandle {
    cmd_tx: UnboundedSender<WatchCmd>,
}

impl WatcherHandle {
    /// Run a sweep now instead of waiting for the next tick.
    pub fn sweep(&self) {
        let _ = self.cmd_tx.send(WatchCmd::Sweep);
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(WatchCmd::Shutdown);
    }
}

// ── Internals ───────────────────────────────────────────────────────

fn sweep<C: ChainSource>(
    service: &TradeService,
    chain: &C,
    event_tx: &UnboundedSender<WatcherEvent>,
) {
    let chain_answered = match service.settle_confirmed_trades(chain) {
        Ok(settled) => {
            for trade in settled {
                let _ = event_tx.send(WatcherEvent::TradeSettled {
                    trade_id: trade.id().to_string(),
                });
            }
            true
        }
        Err(e) => {
            log::warn!("trade_watcher: settlement sweep failed: {e}");
            let _ = event_tx.send(WatcherEvent::SweepFailed {
                error: e.to_string(),
            });
            false
        }
    };

    // A completed trade may already be confirmed; without an answer from the
    // chain only accepted trades can expire.
    let expired = if chain_answered {
        service.expire_trades()
    } else {
        service.expire_accepted_trades()
    };
    match expired {
        Ok(expired) => {
            for trade in expired {
                let _ = event_tx.send(WatcherEvent::TradeExpired {
                    trade_id: trade.id().to_string(),
                });
            }
        }
        Err(e) => {
            log::warn!("trade_watcher: expiry sweep failed: {e}");
            let _ = event_tx.send(WatcherEvent::SweepFailed {
                error: e.to_string(),
            });
        }
    }
}

// ── Spawn ───────────────────────────────────────────────────────────

/// Spawn the watcher on the current tokio runtime.
///
/// Returns a handle for sending commands, and a receiver for watcher events.
pub fn spawn_trade_watcher<C>(
    service: Arc<TradeService>,
    chain: Arc<C>,
    interval: Duration,
) -> (WatcherHandle, UnboundedReceiver<WatcherEvent>)
where
    C: ChainSource + Send + Sync + 'static,
{
    let (cmd_tx, mut cmd_rx) = tokio::sync::mpsc::unbounded_channel();
    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!("trade_watcher: started, interval {interval:?}");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                cmd = cmd_rx.recv() => match cmd {
                    Some(WatchCmd::Sweep) => log::debug!("trade_watcher: sweep requested"),
                    Some(WatchCmd::Shutdown) | None => {
                        log::info!("trade_watcher: shutdown");
                        break;
                    }
                },
            }
            sweep(&service, chain.as_ref(), &event_tx);
        }
    });

    (WatcherHandle { cmd_tx }, event_rx)
}
