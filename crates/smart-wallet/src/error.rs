use thiserror::Error;

use crate::channel::ChannelError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid account index: {0}")]
    InvalidIndex(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported asset {asset}: {reason}")]
    UnsupportedAsset { asset: String, reason: String },

    #[error("Invalid transaction options: {0}")]
    InvalidOptions(String),

    /// A read against the network failed.
    #[error("Network error: {0}")]
    Network(#[source] ChannelError),

    /// The network refused a transaction or one of the lookups needed to
    /// build it.
    #[error("Submission failed: {0}")]
    Submission(#[source] ChannelError),

    #[error("Transaction {hash} reverted")]
    Reverted { hash: String },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<chain_eth::EthError> for WalletError {
    fn from(e: chain_eth::EthError) -> Self {
        use chain_eth::EthError;

        match e {
            EthError::InvalidAddress(msg) => WalletError::InvalidAddress(msg),
            EthError::InvalidPrivateKey(msg) => {
                WalletError::Configuration(format!("invalid private key: {msg}"))
            }
            EthError::SigningError(msg) => WalletError::SigningFailed(msg),
            other => WalletError::Encoding(other.to_string()),
        }
    }
}
