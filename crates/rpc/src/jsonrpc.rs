//! JSON-RPC 2.0 request building and response decoding.

use crate::error::{RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sui_ops_core::{Mist, SuiAddress};

pub const METHOD_GET_BALANCE: &str = "suix_getBalance";
pub const METHOD_QUERY_TX_BLOCKS: &str = "suix_queryTransactionBlocks";

/// JSON-RPC request envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC response envelope; exactly one of `result`/`error` is expected.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// Unwrap into the `result` value, mapping an `error` object to [`RpcError::Rpc`].
    pub fn into_result(self) -> RpcResult<Value> {
        if let Some(err) = self.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result
            .ok_or_else(|| RpcError::MalformedResponse("missing result".to_string()))
    }
}

/// `suix_getBalance` for the default coin type, or `coin_type` when given.
pub fn balance_request(address: &SuiAddress, coin_type: Option<&str>) -> JsonRpcRequest {
    let params = match coin_type {
        Some(coin_type) => json!([address.as_str(), coin_type]),
        None => json!([address.as_str()]),
    };
    JsonRpcRequest::new(METHOD_GET_BALANCE, params)
}

/// Newest single transaction block whose recipient is `address`, digest only.
pub fn latest_incoming_tx_request(address: &SuiAddress) -> JsonRpcRequest {
    let query = json!({
        "filter": { "ToAddress": address.as_str() },
        "options": {
            "showEffects": false,
            "showInput": false,
            "showEvents": false,
            "showObjectChanges": false,
            "showBalanceChanges": false
        }
    });
    JsonRpcRequest::new(METHOD_QUERY_TX_BLOCKS, json!([query, null, 1, true]))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResult {
    total_balance: String,
}

/// Read `totalBalance` (a decimal string) out of a `suix_getBalance` result.
pub fn parse_balance(result: Value) -> RpcResult<Mist> {
    let balance: BalanceResult = serde_json::from_value(result)?;
    balance
        .total_balance
        .parse::<Mist>()
        .map_err(|e| RpcError::MalformedResponse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TxPage {
    #[serde(default)]
    data: Vec<TxBlock>,
}

#[derive(Debug, Deserialize)]
struct TxBlock {
    digest: String,
}

/// First digest of a `suix_queryTransactionBlocks` page, if the page is non-empty.
pub fn parse_latest_digest(result: Value) -> RpcResult<Option<String>> {
    let page: TxPage = serde_json::from_value(result)?;
    Ok(page.data.into_iter().next().map(|tx| tx.digest))
}
