//! Read-only view of the chain used to detect settled trades.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Backend answering confirmation queries for trade transactions.
pub trait ChainSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Block time (unix seconds) of the block confirming `txid`, or `None`
    /// while the transaction is unconfirmed or unknown.
    fn confirmation_time(&self, txid: &str) -> std::result::Result<Option<i64>, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
#[error("chain source unavailable")]
pub struct Unavailable;

/// Chain source fed by hand, for tests and offline runs.
#[derive(Default)]
pub struct StaticChain {
    confirmed: Mutex<HashMap<String, i64>>,
    offline: AtomicBool,
}

impl StaticChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm(&self, txid: &str, block_time: i64) {
        self.confirmed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(txid.to_string(), block_time);
    }

    /// Make every query fail until set back to `false`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }
}

impl ChainSource for StaticChain {
    type Error = Unavailable;

    fn confirmation_time(&self, txid: &str) -> std::result::Result<Option<i64>, Unavailable> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(Unavailable);
        }
        Ok(self
            .confirmed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(txid)
            .copied())
    }
}
