use alloy_primitives::U256;

use crate::abi::{decode_uint256, encode_function_call, AbiParam};
use crate::address::parse_address;
use crate::error::EthError;

/// Function selector for `balanceOf(address)`: `0x70a08231`.
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Function selector for `decimals()`: `0x313ce567`.
const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// Encodes an ERC-20 `balanceOf(address)` call.
///
/// # Parameters
///
/// - `owner`: The address to query (0x-prefixed hex string).
///
/// # Returns
///
/// The complete calldata (4-byte selector + 32 bytes of ABI-encoded address).
pub fn encode_balance_of(owner: &str) -> Result<Vec<u8>, EthError> {
    let addr = parse_address(owner)?;
    let params = [AbiParam::Address(addr)];
    Ok(encode_function_call(BALANCE_OF_SELECTOR, &params))
}

/// Encodes an ERC-20 `decimals()` call.
pub fn encode_decimals() -> Vec<u8> {
    encode_function_call(DECIMALS_SELECTOR, &[])
}

/// Decodes the return data of `balanceOf`.
pub fn decode_balance(data: &[u8]) -> Result<U256, EthError> {
    decode_uint256(data, 0)
}

/// Decodes the return data of `decimals()`.
///
/// The standard declares `uint8`; anything wider is rejected.
pub fn decode_decimals(data: &[u8]) -> Result<u8, EthError> {
    let value = decode_uint256(data, 0)?;
    u8::try_from(value)
        .map_err(|_| EthError::DecodingError(format!("decimals out of range: {value}")))
}
