//! Sui JSON-RPC client.
//!
//! Covers the two read calls the ops tools need:
//! - `suix_getBalance` for an address's total SUI balance
//! - `suix_queryTransactionBlocks` for the latest transaction sent to an address

pub mod client;
pub mod error;
pub mod jsonrpc;

pub use client::{decode_http_response, ChainClient, MockChainClient, SuiRpcClient, SuiRpcConfig};
pub use error::{RpcError, RpcResult};
