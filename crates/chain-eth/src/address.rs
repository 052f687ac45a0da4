use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// The all-zero address. Contracts use it as the marker for the chain's
/// native currency.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Derives an EIP-55 checksummed Ethereum address from an uncompressed secp256k1
/// public key (65 bytes, starting with 0x04).
///
/// The derivation takes the Keccak-256 hash of the 64-byte public key (without
/// the 0x04 prefix) and uses the last 20 bytes as the address.
pub fn pubkey_to_eth_address(uncompressed_pubkey: &[u8; 65]) -> Result<String, EthError> {
    if uncompressed_pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    let hash = Keccak256::digest(&uncompressed_pubkey[1..]);

    let mut addr_bytes = [0u8; 20];
    addr_bytes.copy_from_slice(&hash[12..]);

    Ok(format_address(&addr_bytes))
}

/// Parses a 0x-prefixed hex address string into a 20-byte array.
///
/// Case is ignored; use [`validate_address`] when the checksum matters.
pub fn parse_address(address: &str) -> Result<[u8; 20], EthError> {
    let hex_str = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_str.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_str.len()
        )));
    }

    let bytes = hex::decode(hex_str)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes);
    Ok(addr)
}

/// Renders raw address bytes as an EIP-55 checksummed string.
pub fn format_address(address: &[u8; 20]) -> String {
    let hex_part = hex::encode(address);
    apply_checksum(&hex_part)
}

/// Returns `true` when `address` is absent, empty, or the zero address.
///
/// Malformed strings are not treated as zero; they are left for
/// [`parse_address`] to reject.
pub fn is_zero_address(address: Option<&str>) -> bool {
    match address {
        None => true,
        Some(addr) if addr.is_empty() => true,
        Some(addr) => matches!(parse_address(addr), Ok(bytes) if bytes == [0u8; 20]),
    }
}

/// Validates an Ethereum address string.
///
/// Checks that the address has the correct format (0x + 40 hex characters).
/// If the address contains mixed case, the EIP-55 checksum is verified.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    let bytes = parse_address(address)?;
    let hex_part = &address[2..];

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());

    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    // Either prefix case is accepted; only the digits carry the checksum.
    Ok(format_address(&bytes)[2..] == *hex_part)
}

/// Applies EIP-55 mixed-case checksum encoding to an Ethereum address.
///
/// The input should be a 0x-prefixed address in any case. Returns the
/// checksummed version.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let bytes = parse_address(address)?;
    Ok(format_address(&bytes))
}

/// Checksums 40 lowercase hex characters.
fn apply_checksum(hex_lower: &str) -> String {
    // EIP-55: hash the lowercase hex address (without 0x).
    let hash = Keccak256::digest(hex_lower.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in hex_lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    checksummed
}
