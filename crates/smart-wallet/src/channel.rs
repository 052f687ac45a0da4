//! The seam between the wallet client and an Ethereum node.
//!
//! Everything that touches the network goes through [`NetworkChannel`]. The
//! client never retries; timeouts and cancellation belong to the channel.

use alloy_primitives::U256;
use async_trait::async_trait;
use chain_eth::transaction::EthTransaction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::TxOptions;

/// JSON-RPC error code nodes use for a reverted `eth_call`/`eth_estimateGas`.
const EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The channel could not make sense of the caller's transaction options.
    #[error("invalid transaction options: {0}")]
    InvalidOptions(String),
}

impl ChannelError {
    /// Returns `true` when the node reports that the EVM reverted.
    pub fn is_execution_revert(&self) -> bool {
        match self {
            ChannelError::Rpc { code, message } => {
                *code == EXECUTION_REVERTED || message.contains("execution reverted")
            }
            _ => false,
        }
    }
}

/// A contract call about to become a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: String,
    pub to: String,
    pub data: Vec<u8>,
    pub value: U256,
}

/// Fee information sampled from the chain head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeData {
    /// Base fee of the latest block; `None` on chains without EIP-1559.
    pub base_fee_per_gas: Option<u128>,
    /// The node's priority fee suggestion, when it offers one.
    pub max_priority_fee_per_gas: Option<u128>,
    pub gas_price: u128,
}

/// The parts of a mined transaction receipt the client looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
}

/// Read and submit access to an EVM chain.
///
/// Implementations must be safe to share across tasks: accounts derived from
/// the same client issue calls concurrently.
#[async_trait]
pub trait NetworkChannel: Send + Sync {
    /// The chain id transactions are signed for.
    async fn chain_id(&self) -> Result<u64, ChannelError>;

    /// Executes a read-only call at the latest block and returns the raw
    /// return data.
    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ChannelError>;

    /// Native balance of `address` in wei.
    async fn balance(&self, address: &str) -> Result<U256, ChannelError>;

    /// Next nonce for `address`, counting pending transactions.
    async fn transaction_count(&self, address: &str) -> Result<u64, ChannelError>;

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ChannelError>;

    async fn fee_data(&self) -> Result<FeeData, ChannelError>;

    /// Turns `request` into a transaction ready for signing.
    ///
    /// `options` arrive exactly as the caller wrote them. The default reads
    /// the common override keys and fills the rest from the chain; see
    /// [`crate::options::fill_transaction`].
    async fn fill_transaction(
        &self,
        request: &CallRequest,
        options: &TxOptions,
    ) -> Result<EthTransaction, ChannelError> {
        crate::options::fill_transaction(self, request, options).await
    }

    /// Broadcasts a signed transaction and returns its hash.
    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, ChannelError>;

    /// `Ok(None)` while the transaction is not yet mined.
    async fn transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, ChannelError>;
}
