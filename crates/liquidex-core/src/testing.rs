//! Scriptable [`SwapParser`] for tests.
//!
//! Messages are JSON encoded and identified by the SHA256 of their inputs.
//! Each step can be set up to reject, simulating a misbehaving counterparty.

use sha2::{Digest, Sha256};

use crate::market::is_valid_asset;
use crate::swap::{
    AcceptArgs, SwapAccept, SwapComplete, SwapError, SwapFail, SwapFailCode, SwapParser,
    SwapRequest, TransactionDetails,
};

#[derive(Debug, Clone, Default)]
pub struct MockSwapParser {
    request_error: Option<SwapError>,
    accept_error: Option<SwapError>,
    complete_error: Option<SwapError>,
    transaction_error: Option<SwapError>,
}

impl MockSwapParser {
    pub fn fail_request(mut self, error: SwapError) -> Self {
        self.request_error = Some(error);
        self
    }

    pub fn fail_accept(mut self, error: SwapError) -> Self {
        self.accept_error = Some(error);
        self
    }

    pub fn fail_complete(mut self, error: SwapError) -> Self {
        self.complete_error = Some(error);
        self
    }

    pub fn fail_transaction(mut self, error: SwapError) -> Self {
        self.transaction_error = Some(error);
        self
    }
}

/// Hex SHA256 over the concatenated parts.
pub fn message_id(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

fn encode<T: serde::Serialize>(value: &T, code: SwapFailCode) -> Result<Vec<u8>, SwapError> {
    serde_json::to_vec(value).map_err(|e| SwapError::new(code, e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(
    message: &[u8],
    code: SwapFailCode,
) -> Result<T, SwapError> {
    serde_json::from_slice(message).map_err(|e| SwapError::new(code, e.to_string()))
}

impl SwapParser for MockSwapParser {
    fn serialize_request(&self, request: &SwapRequest) -> Result<Vec<u8>, SwapError> {
        if let Some(e) = &self.request_error {
            return Err(e.clone());
        }
        let invalid = |msg: &str| SwapError::new(SwapFailCode::InvalidSwapRequest, msg);
        if request.amount_p == 0 || request.amount_r == 0 {
            return Err(invalid("amounts must be non-zero"));
        }
        if !is_valid_asset(&request.asset_p) || !is_valid_asset(&request.asset_r) {
            return Err(invalid("invalid asset"));
        }
        if request.asset_p.eq_ignore_ascii_case(&request.asset_r) {
            return Err(invalid("assets must differ"));
        }
        if request.transaction.is_empty() {
            return Err(invalid("missing transaction"));
        }
        encode(request, SwapFailCode::InvalidSwapRequest)
    }

    fn serialize_accept(&self, args: AcceptArgs<'_>) -> Result<(String, Vec<u8>), SwapError> {
        if let Some(e) = &self.accept_error {
            return Err(e.clone());
        }
        let request: SwapRequest = decode(args.request_message, SwapFailCode::InvalidSwapAccept)?;
        if args.transaction.is_empty() {
            return Err(SwapError::new(
                SwapFailCode::InvalidSwapAccept,
                "missing transaction",
            ));
        }
        let accept = SwapAccept {
            id: message_id(&[args.request_message, args.transaction.as_bytes()]),
            request_id: request.id,
            transaction: args.transaction.to_string(),
            input_blinding_keys: args.input_blinding_keys.to_vec(),
            output_blinding_keys: args.output_blinding_keys.to_vec(),
        };
        let message = encode(&accept, SwapFailCode::InvalidSwapAccept)?;
        Ok((accept.id, message))
    }

    fn serialize_complete(
        &self,
        _request_message: &[u8],
        accept_message: &[u8],
        transaction: &str,
    ) -> Result<(String, Vec<u8>), SwapError> {
        if let Some(e) = &self.complete_error {
            return Err(e.clone());
        }
        let accept: SwapAccept = decode(accept_message, SwapFailCode::InvalidSwapComplete)?;
        let complete = SwapComplete {
            id: message_id(&[accept_message, transaction.as_bytes()]),
            accept_id: accept.id,
            transaction: transaction.to_string(),
        };
        let message = encode(&complete, SwapFailCode::InvalidSwapComplete)?;
        Ok((complete.id, message))
    }

    fn serialize_fail(
        &self,
        reply_to: &str,
        code: SwapFailCode,
        message: &str,
    ) -> (String, Vec<u8>) {
        let fail = SwapFail {
            id: message_id(&[
                reply_to.as_bytes(),
                &code.as_u32().to_be_bytes(),
                message.as_bytes(),
            ]),
            message_id: reply_to.to_string(),
            failure_code: code,
            failure_message: message.to_string(),
        };
        let bytes = serde_json::to_vec(&fail).unwrap_or_default();
        (fail.id, bytes)
    }

    fn deserialize_request(&self, message: &[u8]) -> Result<SwapRequest, SwapError> {
        decode(message, SwapFailCode::InvalidSwapRequest)
    }

    fn deserialize_accept(&self, message: &[u8]) -> Result<SwapAccept, SwapError> {
        decode(message, SwapFailCode::InvalidSwapAccept)
    }

    fn deserialize_complete(&self, message: &[u8]) -> Result<SwapComplete, SwapError> {
        decode(message, SwapFailCode::InvalidSwapComplete)
    }

    fn deserialize_fail(&self, message: &[u8]) -> Result<SwapFail, SwapError> {
        decode(message, SwapFailCode::Aborted)
    }

    /// The txid is the SHA256 of the transaction string and the hex is its
    /// byte encoding; good enough to tell transactions apart in tests.
    fn parse_swap_transaction(&self, transaction: &str) -> Result<TransactionDetails, SwapError> {
        if let Some(e) = &self.transaction_error {
            return Err(e.clone());
        }
        if transaction.is_empty() {
            return Err(SwapError::new(
                SwapFailCode::InvalidTransaction,
                "empty transaction",
            ));
        }
        Ok(TransactionDetails {
            pset_base64: String::new(),
            tx_hex: hex::encode(transaction),
            txid: message_id(&[transaction.as_bytes()]),
        })
    }
}
