//! Ethereum/EVM primitives for the factory wallet client.
//!
//! This crate provides:
//! - EIP-55 address checksums and parsing
//! - CREATE2 address prediction for EIP-1167 minimal proxy clones
//! - Minimal ABI encoding and decoding (static words plus `address[]`)
//! - ERC-20 read calls (`balanceOf`, `decimals`)
//! - Legacy (EIP-155) and EIP-1559 transaction building, signing and decoding

pub mod abi;
pub mod address;
pub mod create2;
pub mod erc20;
pub mod error;
pub mod transaction;

pub use error::EthError;
