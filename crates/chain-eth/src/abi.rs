//! Minimal ABI encoding for EVM function calls.
//!
//! This module provides just enough ABI encoding and decoding to talk to the
//! wallet factory and ERC-20 tokens without pulling in a full ABI parser.

use alloy_primitives::U256;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// A single ABI-encoded parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// A 20-byte Ethereum address, left-padded to 32 bytes.
    Address([u8; 20]),
    /// A 256-bit unsigned integer, big-endian.
    Uint256(U256),
    /// A boolean, encoded as 0 or 1.
    Bool(bool),
    /// A `bytes32` value, stored as-is.
    FixedBytes32([u8; 32]),
    /// A dynamic `address[]`. Encoded in the tail, referenced by offset.
    AddressArray(Vec<[u8; 20]>),
}

impl AbiParam {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiParam::AddressArray(_))
    }
}

/// Computes the 4-byte selector of a canonical function signature such as
/// `"balanceOf(address)"`.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// Encodes a function call with the given 4-byte selector and ABI parameters.
///
/// Static parameters are laid out in order as 32-byte words. Each dynamic
/// parameter contributes an offset word to the head and its contents to the
/// tail, per the Solidity ABI specification.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let head_len = params.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for param in params {
        if param.is_dynamic() {
            let offset = U256::from(head_len + tail.len());
            head.extend_from_slice(&offset.to_be_bytes::<32>());
            encode_tail(param, &mut tail);
        } else {
            head.extend_from_slice(&encode_word(param));
        }
    }

    let mut data = Vec::with_capacity(4 + head.len() + tail.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&head);
    data.extend_from_slice(&tail);
    data
}

/// Encodes a static [`AbiParam`] as a 32-byte ABI word.
fn encode_word(param: &AbiParam) -> [u8; 32] {
    match param {
        AbiParam::Address(addr) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr);
            word
        }
        AbiParam::Uint256(value) => value.to_be_bytes::<32>(),
        AbiParam::Bool(flag) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*flag);
            word
        }
        AbiParam::FixedBytes32(bytes) => *bytes,
        AbiParam::AddressArray(_) => [0u8; 32],
    }
}

/// Appends the tail encoding of a dynamic parameter: length word, then items.
fn encode_tail(param: &AbiParam, tail: &mut Vec<u8>) {
    if let AbiParam::AddressArray(items) = param {
        tail.extend_from_slice(&U256::from(items.len()).to_be_bytes::<32>());
        for item in items {
            tail.extend_from_slice(&encode_word(&AbiParam::Address(*item)));
        }
    }
}

/// Returns the `index`-th 32-byte word of ABI return data.
pub fn decode_word(data: &[u8], index: usize) -> Result<[u8; 32], EthError> {
    let start = index.saturating_mul(WORD);
    let end = start.saturating_add(WORD);
    if data.len() < end {
        return Err(EthError::DecodingError(format!(
            "no word {index} in {} bytes of data",
            data.len()
        )));
    }

    let mut word = [0u8; 32];
    word.copy_from_slice(&data[start..end]);
    Ok(word)
}

/// Decodes a uint256 return value at word `index`.
pub fn decode_uint256(data: &[u8], index: usize) -> Result<U256, EthError> {
    let word = decode_word(data, index)?;
    Ok(U256::from_be_bytes(word))
}

/// Decodes an address return value at word `index`.
///
/// The 12 padding bytes must be zero.
pub fn decode_address(data: &[u8], index: usize) -> Result<[u8; 20], EthError> {
    let word = decode_word(data, index)?;
    if word[..12].iter().any(|&b| b != 0) {
        return Err(EthError::DecodingError(format!(
            "word {index} is not a left-padded address"
        )));
    }

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&word[12..]);
    Ok(addr)
}

/// Decodes a dynamic `address[]` whose offset word sits at head word `index`.
pub fn decode_address_array(data: &[u8], index: usize) -> Result<Vec<[u8; 20]>, EthError> {
    let offset = word_to_usize(decode_uint256(data, index)?, "offset")?;
    if offset % WORD != 0 {
        return Err(EthError::DecodingError(format!(
            "array offset {offset} is not word aligned"
        )));
    }

    let start = offset / WORD;
    let len = word_to_usize(decode_uint256(data, start)?, "length")?;
    if len > data.len() / WORD {
        return Err(EthError::DecodingError(format!(
            "array length {len} exceeds {} bytes of data",
            data.len()
        )));
    }

    (0..len)
        .map(|i| decode_address(data, start + 1 + i))
        .collect()
}

fn word_to_usize(value: U256, what: &str) -> Result<usize, EthError> {
    u64::try_from(value)
        .ok()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| EthError::DecodingError(format!("array {what} out of range: {value}")))
}

/// Decodes a bool return value at word `index`.
pub fn decode_bool(data: &[u8], index: usize) -> Result<bool, EthError> {
    let word = decode_word(data, index)?;
    match U256::from_be_bytes(word) {
        v if v.is_zero() => Ok(false),
        v if v == U256::from(1u8) => Ok(true),
        _ => Err(EthError::DecodingError(format!("word {index} is not a bool"))),
    }
}
