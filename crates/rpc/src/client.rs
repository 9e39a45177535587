//! HTTP JSON-RPC client for a Sui fullnode.

use crate::error::{RpcError, RpcResult};
use crate::jsonrpc::{
    balance_request, latest_incoming_tx_request, parse_balance, parse_latest_digest,
    JsonRpcRequest, JsonRpcResponse,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use sui_ops_core::{Mist, SuiAddress};
use tracing::debug;

/// Read-only chain queries used by the profit monitor.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Total balance of `address`.
    async fn balance(&self, address: &SuiAddress) -> RpcResult<Mist>;

    /// Digest of the newest transaction sent to `address`, if any.
    async fn latest_incoming_tx(&self, address: &SuiAddress) -> RpcResult<Option<String>>;
}

/// Configuration for [`SuiRpcClient`].
#[derive(Debug, Clone)]
pub struct SuiRpcConfig {
    /// Fullnode JSON-RPC endpoint.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Coin type to query; None means the node default (SUI).
    pub coin_type: Option<String>,
}

impl SuiRpcConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            coin_type: None,
        }
    }
}

/// JSON-RPC client over `reqwest`.
pub struct SuiRpcClient {
    config: SuiRpcConfig,
    http_client: reqwest::Client,
}

impl SuiRpcClient {
    pub fn new(config: SuiRpcConfig) -> RpcResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn call(&self, request: &JsonRpcRequest) -> RpcResult<Value> {
        debug!(method = request.method, "Sending RPC request");

        let response = self
            .http_client
            .post(&self.config.url)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_http_response(status, &body)
    }
}

/// Classify an HTTP reply: non-2xx becomes [`RpcError::HttpStatus`], otherwise
/// the body is decoded as a JSON-RPC envelope.
pub fn decode_http_response(status: StatusCode, body: &str) -> RpcResult<Value> {
    if !status.is_success() {
        return Err(RpcError::HttpStatus {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let envelope: JsonRpcResponse = serde_json::from_str(body)?;
    envelope.into_result()
}

#[async_trait]
impl ChainClient for SuiRpcClient {
    async fn balance(&self, address: &SuiAddress) -> RpcResult<Mist> {
        let request = balance_request(address, self.config.coin_type.as_deref());
        let result = self.call(&request).await?;
        parse_balance(result)
    }

    async fn latest_incoming_tx(&self, address: &SuiAddress) -> RpcResult<Option<String>> {
        let request = latest_incoming_tx_request(address);
        let result = self.call(&request).await?;
        parse_latest_digest(result)
    }
}

/// Scripted chain client for testing.
/// Balances are served in order; once exhausted the last balance repeats.
#[derive(Default)]
pub struct MockChainClient {
    balances: Mutex<VecDeque<RpcResult<Mist>>>,
    last_balance: Mutex<Option<Mist>>,
    latest_tx: Mutex<Option<String>>,
    fail_tx_lookup: bool,
    balance_calls: Mutex<u32>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue balance readings.
    pub fn with_balances(self, balances: impl IntoIterator<Item = RpcResult<Mist>>) -> Self {
        if let Ok(mut queue) = self.balances.lock() {
            queue.extend(balances);
        }
        self
    }

    pub fn with_latest_tx(self, digest: impl Into<String>) -> Self {
        if let Ok(mut tx) = self.latest_tx.lock() {
            *tx = Some(digest.into());
        }
        self
    }

    pub fn with_failing_tx_lookup(mut self) -> Self {
        self.fail_tx_lookup = true;
        self
    }

    pub fn balance_calls(&self) -> u32 {
        self.balance_calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn balance(&self, _address: &SuiAddress) -> RpcResult<Mist> {
        if let Ok(mut calls) = self.balance_calls.lock() {
            *calls += 1;
        }

        let next = self.balances.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(balance)) => {
                if let Ok(mut last) = self.last_balance.lock() {
                    *last = Some(balance);
                }
                Ok(balance)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last_balance
                .lock()
                .ok()
                .and_then(|last| *last)
                .ok_or_else(|| RpcError::Transport("mock has no balances".to_string())),
        }
    }

    async fn latest_incoming_tx(&self, _address: &SuiAddress) -> RpcResult<Option<String>> {
        if self.fail_tx_lookup {
            return Err(RpcError::Timeout("mock tx lookup".to_string()));
        }
        Ok(self.latest_tx.lock().ok().and_then(|tx| tx.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr() -> SuiAddress {
        SuiAddress::parse("0x1").unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = SuiRpcConfig::new("https://fullnode.mainnet.sui.io:443");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.coin_type.is_none());

        let client = SuiRpcClient::new(config).unwrap();
        assert_eq!(client.url(), "https://fullnode.mainnet.sui.io:443");
    }

    #[test]
    fn test_decode_http_response_ok() {
        let result = decode_http_response(
            StatusCode::OK,
            r#"{"jsonrpc":"2.0","id":1,"result":{"totalBalance":"42"}}"#,
        )
        .unwrap();
        assert_eq!(result["totalBalance"], "42");
    }

    #[test]
    fn test_decode_http_response_rate_limited() {
        let err = decode_http_response(StatusCode::TOO_MANY_REQUESTS, "slow down").unwrap_err();
        assert!(matches!(
            &err,
            RpcError::HttpStatus { status: 429, body } if body == "slow down"
        ));
        assert!(err.is_transient());
        assert_eq!(err.suggested_retry_delay(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_decode_http_response_bad_gateway_html() {
        let err = decode_http_response(StatusCode::BAD_GATEWAY, "<html>502</html>").unwrap_err();
        assert!(matches!(err, RpcError::HttpStatus { status: 502, .. }));
    }

    #[test]
    fn test_decode_http_response_rpc_error_and_garbage() {
        let err = decode_http_response(
            StatusCode::OK,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid params"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RpcError::Rpc { code: -32602, .. }));

        let err = decode_http_response(StatusCode::OK, "<html>ok</html>").unwrap_err();
        assert!(matches!(err, RpcError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_mock_serves_balances_in_order() {
        let client = MockChainClient::new().with_balances([
            Ok(Mist(1)),
            Err(RpcError::Transport("down".into())),
            Ok(Mist(3)),
        ]);

        assert_eq!(client.balance(&addr()).await.unwrap(), Mist(1));
        assert!(client.balance(&addr()).await.is_err());
        assert_eq!(client.balance(&addr()).await.unwrap(), Mist(3));
        // Exhausted: repeats the last good balance
        assert_eq!(client.balance(&addr()).await.unwrap(), Mist(3));
        assert_eq!(client.balance_calls(), 4);
    }

    #[tokio::test]
    async fn test_mock_tx_lookup() {
        let client = MockChainClient::new().with_latest_tx("Digest1");
        assert_eq!(
            client.latest_incoming_tx(&addr()).await.unwrap(),
            Some("Digest1".to_string())
        );

        let failing = MockChainClient::new().with_failing_tx_lookup();
        assert!(failing.latest_incoming_tx(&addr()).await.is_err());
    }
}
