//! Swap protocol boundary.
//!
//! Message encodings and PSET validation belong to a [`SwapParser`]
//! implementation handed to the trade lifecycle; this crate only consumes
//! the typed results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a counterparty message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum SwapFailCode {
    InvalidSwapRequest = 10,
    InvalidSwapAccept = 11,
    InvalidSwapComplete = 12,
    InvalidTransaction = 13,
    TradeExpired = 20,
    Aborted = 99,
}

impl SwapFailCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            10 => Some(Self::InvalidSwapRequest),
            11 => Some(Self::InvalidSwapAccept),
            12 => Some(Self::InvalidSwapComplete),
            13 => Some(Self::InvalidTransaction),
            20 => Some(Self::TradeExpired),
            99 => Some(Self::Aborted),
            _ => None,
        }
    }
}

/// Soft rejection returned by a [`SwapParser`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct SwapError {
    pub code: SwapFailCode,
    pub message: String,
}

impl SwapError {
    pub fn new(code: SwapFailCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Trader's proposal: send `amount_p` of `asset_p`, receive `amount_r` of
/// `asset_r`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub id: String,
    pub asset_p: String,
    pub amount_p: u64,
    pub asset_r: String,
    pub amount_r: u64,
    /// Base64 PSET funded by the trader.
    pub transaction: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapAccept {
    pub id: String,
    pub request_id: String,
    /// Base64 PSET with the maker's inputs and outputs added.
    pub transaction: String,
    /// Blinding material for the maker's inputs, opaque here.
    pub input_blinding_keys: Vec<Vec<u8>>,
    pub output_blinding_keys: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapComplete {
    pub id: String,
    pub accept_id: String,
    /// Signed PSET (base64) or final transaction (hex).
    pub transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapFail {
    pub id: String,
    pub message_id: String,
    pub failure_code: SwapFailCode,
    pub failure_message: String,
}

/// Arguments for building a swap accept message.
#[derive(Debug, Clone, Copy)]
pub struct AcceptArgs<'a> {
    pub request_message: &'a [u8],
    pub transaction: &'a str,
    pub input_blinding_keys: &'a [Vec<u8>],
    pub output_blinding_keys: &'a [Vec<u8>],
}

/// Finalised transaction extracted from a swap complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub pset_base64: String,
    pub tx_hex: String,
    pub txid: String,
}

/// Swap protocol codec and validator.
///
/// Every method is treated as a synchronous pure function. An `Err` is a
/// business rejection of counterparty data, not a system failure.
pub trait SwapParser: Send + Sync {
    /// Validate a request and return its wire encoding.
    fn serialize_request(&self, request: &SwapRequest) -> Result<Vec<u8>, SwapError>;

    /// Validate the maker's completed PSET against the request and return
    /// `(accept_id, message)`.
    fn serialize_accept(&self, args: AcceptArgs<'_>) -> Result<(String, Vec<u8>), SwapError>;

    /// Validate the counterparty's signed transaction and return
    /// `(complete_id, message)`.
    fn serialize_complete(
        &self,
        request_message: &[u8],
        accept_message: &[u8],
        transaction: &str,
    ) -> Result<(String, Vec<u8>), SwapError>;

    /// Build a fail message replying to `message_id`. Returns `(fail_id, message)`.
    fn serialize_fail(
        &self,
        message_id: &str,
        code: SwapFailCode,
        message: &str,
    ) -> (String, Vec<u8>);

    fn deserialize_request(&self, message: &[u8]) -> Result<SwapRequest, SwapError>;

    fn deserialize_accept(&self, message: &[u8]) -> Result<SwapAccept, SwapError>;

    fn deserialize_complete(&self, message: &[u8]) -> Result<SwapComplete, SwapError>;

    fn deserialize_fail(&self, message: &[u8]) -> Result<SwapFail, SwapError>;

    /// Extract the final transaction from a signed PSET or raw tx hex.
    fn parse_swap_transaction(&self, transaction: &str) -> Result<TransactionDetails, SwapError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_code_roundtrip() {
        for code in [
            SwapFailCode::InvalidSwapRequest,
            SwapFailCode::InvalidSwapAccept,
            SwapFailCode::InvalidSwapComplete,
            SwapFailCode::InvalidTransaction,
            SwapFailCode::TradeExpired,
            SwapFailCode::Aborted,
        ] {
            assert_eq!(SwapFailCode::from_u32(code.as_u32()), Some(code));
        }
        assert_eq!(SwapFailCode::from_u32(0), None);
    }
}
