use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Core(#[from] liquidex_core::Error),

    #[error("utxo {key} is already locked by {owner}")]
    AlreadyLocked { key: String, owner: String },

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config JSON error: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("chain source error: {0}")]
    Chain(String),

    #[error("balance lookup failed: {0}")]
    Balances(String),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

impl DaemonError {
    /// The wrapped core error, if any.
    pub fn core(&self) -> Option<&liquidex_core::Error> {
        match self {
            DaemonError::Core(e) => Some(e),
            _ => None,
        }
    }
}
