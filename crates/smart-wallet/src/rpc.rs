//! Ethereum JSON-RPC over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::trace;

use crate::channel::{CallRequest, ChannelError, FeeData, NetworkChannel, TransactionReceipt};

/// A [`NetworkChannel`] backed by a node's HTTP JSON-RPC endpoint.
///
/// The chain id is fixed at construction, so signing never needs a round
/// trip to learn it.
#[derive(Debug)]
pub struct HttpChannel {
    client: reqwest::Client,
    url: String,
    chain_id: u64,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    gas_used: String,
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    base_fee_per_gas: Option<String>,
}

impl HttpChannel {
    pub fn new(url: impl Into<String>, chain_id: u64) -> Self {
        Self::with_client(reqwest::Client::new(), url, chain_id)
    }

    /// Uses a preconfigured client, e.g. one with timeouts or proxies set.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            client,
            url: url.into(),
            chain_id,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issues one request; `Ok(None)` when the node answers `null`.
    async fn request_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ChannelError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(id, method, "rpc request");

        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        let body: RpcResponse<T> = response.json().await.map_err(|e| {
            ChannelError::InvalidResponse(format!("{method} (http {status}): {e}"))
        })?;

        if let Some(error) = body.error {
            return Err(ChannelError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(body.result)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChannelError> {
        self.request_optional(method, params)
            .await?
            .ok_or_else(|| ChannelError::InvalidResponse(format!("{method} returned null")))
    }
}

#[async_trait]
impl NetworkChannel for HttpChannel {
    async fn chain_id(&self) -> Result<u64, ChannelError> {
        Ok(self.chain_id)
    }

    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ChannelError> {
        let params = json!([{ "to": to, "data": to_hex(data) }, "latest"]);
        let result: String = self.request("eth_call", params).await?;
        parse_data(&result)
    }

    async fn balance(&self, address: &str) -> Result<U256, ChannelError> {
        let result: String = self
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_u256(&result)
    }

    async fn transaction_count(&self, address: &str) -> Result<u64, ChannelError> {
        let result: String = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        parse_u64(&result)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ChannelError> {
        let params = json!([{
            "from": request.from,
            "to": request.to,
            "data": to_hex(&request.data),
            "value": format!("{:#x}", request.value),
        }]);
        let result: String = self.request("eth_estimateGas", params).await?;
        parse_u64(&result)
    }

    async fn fee_data(&self) -> Result<FeeData, ChannelError> {
        let block: RpcBlock = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let gas_price: String = self.request("eth_gasPrice", json!([])).await?;

        // Not every node implements this one; absence is not an error.
        let priority = match self
            .request::<String>("eth_maxPriorityFeePerGas", json!([]))
            .await
        {
            Ok(hex) => Some(parse_u128(&hex)?),
            Err(ChannelError::Rpc { .. }) => None,
            Err(e) => return Err(e),
        };

        Ok(FeeData {
            base_fee_per_gas: block.base_fee_per_gas.as_deref().map(parse_u128).transpose()?,
            max_priority_fee_per_gas: priority,
            gas_price: parse_u128(&gas_price)?,
        })
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, ChannelError> {
        self.request("eth_sendRawTransaction", json!([to_hex(raw_tx)]))
            .await
    }

    async fn transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, ChannelError> {
        let receipt: Option<RpcReceipt> = self
            .request_optional("eth_getTransactionReceipt", json!([hash]))
            .await?;

        let Some(receipt) = receipt else {
            return Ok(None);
        };
        // Some nodes return a receipt shell for pending transactions.
        let Some(block_number) = receipt.block_number else {
            return Ok(None);
        };

        Ok(Some(TransactionReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: parse_u64(&block_number)?,
            gas_used: parse_u64(&receipt.gas_used)?,
            // Pre-Byzantium receipts have no status field.
            success: receipt.status.as_deref().map(parse_u64).transpose()? != Some(0),
        }))
    }
}

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn strip_hex_prefix(value: &str) -> Result<&str, ChannelError> {
    value
        .strip_prefix("0x")
        .ok_or_else(|| ChannelError::InvalidResponse(format!("expected 0x-prefixed hex, got {value}")))
}

fn parse_data(value: &str) -> Result<Vec<u8>, ChannelError> {
    hex::decode(strip_hex_prefix(value)?)
        .map_err(|e| ChannelError::InvalidResponse(format!("bad data {value}: {e}")))
}

fn parse_u256(value: &str) -> Result<U256, ChannelError> {
    let digits = strip_hex_prefix(value)?;
    if digits.is_empty() {
        return Err(ChannelError::InvalidResponse("empty quantity".into()));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ChannelError::InvalidResponse(format!("bad quantity {value}: {e}")))
}

fn parse_u64(value: &str) -> Result<u64, ChannelError> {
    u64::try_from(parse_u256(value)?)
        .map_err(|_| ChannelError::InvalidResponse(format!("quantity {value} exceeds u64")))
}

fn parse_u128(value: &str) -> Result<u128, ChannelError> {
    u128::try_from(parse_u256(value)?)
        .map_err(|_| ChannelError::InvalidResponse(format!("quantity {value} exceeds u128")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_u64("0x0").unwrap(), 0);
        assert_eq!(parse_u64("0x1e9b2").unwrap(), 125_362);
        assert_eq!(
            parse_u256("0xde0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert!(parse_u64("1234").is_err());
        assert!(parse_u64("0x").is_err());
        assert!(parse_u64("0x10000000000000000").is_err());
    }

    #[test]
    fn data_parsing() {
        assert_eq!(parse_data("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_data("0x00ff").unwrap(), vec![0x00, 0xff]);
        assert!(parse_data("0xabc").is_err());
    }

    #[test]
    fn request_envelope_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 4,
            method: "eth_chainId",
            params: json!([]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "id": 4, "method": "eth_chainId", "params": []})
        );
    }

    #[test]
    fn response_with_error_object() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted"}}"#;
        let response: RpcResponse<String> = serde_json::from_str(body).unwrap();

        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, 3);
        assert_eq!(error.message, "execution reverted");
    }

    #[test]
    fn null_result_is_none() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        let response: RpcResponse<RpcReceipt> = serde_json::from_str(body).unwrap();
        assert!(response.result.is_none());
    }

    #[test]
    fn receipt_fields_deserialize() {
        let body = r#"{
            "transactionHash": "0xabc",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "status": "0x1",
            "logs": []
        }"#;
        let receipt: RpcReceipt = serde_json::from_str(body).unwrap();

        assert_eq!(receipt.transaction_hash, "0xabc");
        assert_eq!(receipt.block_number.as_deref(), Some("0x10"));
        assert_eq!(parse_u64(&receipt.gas_used).unwrap(), 21_000);
    }

    #[tokio::test]
    async fn chain_id_is_static() {
        let channel = HttpChannel::new("http://127.0.0.1:1", 31337);
        assert_eq!(channel.chain_id().await.unwrap(), 31337);
        assert_eq!(channel.url(), "http://127.0.0.1:1");
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        // Port 1 on loopback refuses connections.
        let channel = HttpChannel::new("http://127.0.0.1:1", 1);
        let err = channel.balance("0x000000000000000000000000000000000000dEaD").await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
    }
}
