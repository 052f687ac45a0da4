//! Client for a smart-contract wallet factory.
//!
//! A factory deploys EIP-1167 minimal proxy clones of a model account at
//! CREATE2 addresses keyed by an integer index. [`WalletClient`] binds a
//! signing identity and a [`NetworkChannel`] to one factory; each
//! [`Account`] it hands out predicts its own address locally and issues
//! reads and writes through the factory.
//!
//! ```no_run
//! # async fn demo() -> Result<(), smart_wallet::WalletError> {
//! use smart_wallet::{TxOptions, WalletClient, WalletConfig};
//!
//! let client = WalletClient::from_config(&WalletConfig::from_env()?)?;
//! let account = client.account(0u64);
//! println!("sub-account 0 lives at {}", account.address());
//!
//! if !account.info().await?.exists {
//!     account.create(&TxOptions::new()).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod index;
pub mod options;
pub mod rpc;
pub mod signer;
pub mod types;
pub mod units;

pub use account::Account;
pub use channel::{CallRequest, ChannelError, FeeData, NetworkChannel, TransactionReceipt};
pub use client::{WalletClient, WalletOptions};
pub use config::WalletConfig;
pub use error::WalletError;
pub use index::AccountIndex;
pub use options::TxOptions;
pub use rpc::HttpChannel;
pub use signer::Signer;
pub use types::{AccountInfo, Balance, PendingTransaction, SwapRequest, TransferRequest, WalletInfo};
pub use units::Quantity;
