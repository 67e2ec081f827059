use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DaemonError, Result};

pub const CONFIG_FILE: &str = "liquidex_config.json";

const DEFAULT_PERCENTAGE_FEE: u32 = 25;
const DEFAULT_TRADE_EXPIRY_SECS: u64 = 120;
const DEFAULT_WATCHER_INTERVAL_MS: u64 = 5_000;
const DEFAULT_PRICE_SLIPPAGE: u32 = 500;

/// Daemon settings persisted as camelCase JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaemonConfig {
    /// Basis points applied to newly created markets.
    pub default_percentage_fee: u32,
    /// Seconds a counterparty has to complete an accepted trade.
    pub trade_expiry_secs: u64,
    pub watcher_interval_ms: u64,
    /// Basis points a proposal's amounts may deviate from the market
    /// preview before it is rejected.
    pub price_slippage: u32,
    pub log_filter: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            default_percentage_fee: DEFAULT_PERCENTAGE_FEE,
            trade_expiry_secs: DEFAULT_TRADE_EXPIRY_SECS,
            watcher_interval_ms: DEFAULT_WATCHER_INTERVAL_MS,
            price_slippage: DEFAULT_PRICE_SLIPPAGE,
            log_filter: "info".to_string(),
        }
    }
}

impl DaemonConfig {
    /// Read the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !liquidex_core::fee::is_valid_percentage_fee(self.default_percentage_fee) {
            return Err(DaemonError::InvalidConfig(format!(
                "defaultPercentageFee must be at most {}, got {}",
                liquidex_core::fee::MAX_PERCENTAGE_FEE,
                self.default_percentage_fee
            )));
        }
        if self.trade_expiry_secs == 0 {
            return Err(DaemonError::InvalidConfig(
                "tradeExpirySecs must be positive".into(),
            ));
        }
        if self.price_slippage > liquidex_core::fee::BASIS_POINT_DENOM {
            return Err(DaemonError::InvalidConfig(format!(
                "priceSlippage must be at most {}, got {}",
                liquidex_core::fee::BASIS_POINT_DENOM,
                self.price_slippage
            )));
        }
        if self.watcher_interval_ms == 0 {
            return Err(DaemonError::InvalidConfig(
                "watcherIntervalMs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn trade_expiry(&self) -> i64 {
        i64::try_from(self.trade_expiry_secs).unwrap_or(i64::MAX)
    }
}
