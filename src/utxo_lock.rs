//! Reservation of wallet UTXOs spent by accepted trades.
//!
//! Keys are opaque outpoint identifiers (`txid:vout`), owners are trade ids.
//! A UTXO stays locked from acceptance until its trade settles, fails or
//! expires, so no second trade can commit the same input.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{DaemonError, Result};

pub trait UtxoLocker: Send + Sync {
    /// Lock `key` for `owner`. Succeeds when the key is free or already held
    /// by the same owner; returns `true` only when this call took it.
    fn lock(&self, key: &str, owner: &str) -> Result<bool>;

    /// Release `key`. Unlocking a free key is a no-op.
    fn unlock(&self, key: &str);

    /// Keys currently held by `owner`.
    fn locked_by(&self, owner: &str) -> Vec<String>;

    /// Release every key held by `owner`, returning how many were released.
    fn unlock_all(&self, owner: &str) -> usize {
        let keys = self.locked_by(owner);
        for key in &keys {
            self.unlock(key);
        }
        keys.len()
    }
}

#[derive(Default)]
pub struct InMemoryUtxoLocker {
    locks: Mutex<HashMap<String, String>>,
}

impl InMemoryUtxoLocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_of(&self, key: &str) -> Option<String> {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.get(key).cloned()
    }
}

impl UtxoLocker for InMemoryUtxoLocker {
    fn lock(&self, key: &str, owner: &str) -> Result<bool> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        match locks.get(key) {
            Some(current) if current != owner => Err(DaemonError::AlreadyLocked {
                key: key.to_string(),
                owner: current.clone(),
            }),
            Some(_) => Ok(false),
            None => {
                locks.insert(key.to_string(), owner.to_string());
                Ok(true)
            }
        }
    }

    fn unlock(&self, key: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(key);
    }

    fn locked_by(&self, owner: &str) -> Vec<String> {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = locks
            .iter()
            .filter(|(_, o)| o.as_str() == owner)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}
