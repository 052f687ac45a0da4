use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::units::Quantity;

/// Decimals of every EVM chain's native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Diagnostic data read from the factory contract itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    /// The template the factory clones; checksummed.
    pub model_account: String,
}

/// A sub-account as the factory's registry reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    /// Whether the clone has been deployed.
    pub exists: bool,
    /// `0x` + 64 hex digits.
    pub salt: String,
}

/// An asset balance in the asset's smallest unit. No scaling is applied;
/// `decimals` is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub units: U256,
    pub decimals: u8,
}

/// Moves an asset out of a sub-account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: String,
    /// Token contract, or `None`/the zero address for the native currency.
    pub asset: Option<String>,
    pub units: Quantity,
}

/// Swaps through a DEX router on behalf of a sub-account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Router-specific swap variant; opaque to the client.
    pub method: Quantity,
    pub router: String,
    pub units_in: Quantity,
    pub units_out_min: Quantity,
    /// Ordered asset addresses describing the route.
    pub path: Vec<String>,
    /// Recipient of the output asset.
    pub to: String,
}

/// A transaction the network has accepted but not necessarily mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
    pub nonce: u64,
}
