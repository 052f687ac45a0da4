//! CREATE2 address prediction for EIP-1167 minimal proxy clones.
//!
//! A factory that deploys clones of a template with `CREATE2` places each
//! clone at an address fixed by the template, the salt and the factory's own
//! address, so the address can be known before the clone exists.

use sha3::{Digest, Keccak256};

use crate::address::{format_address, parse_address};
use crate::error::EthError;

/// Creation code prefix of an EIP-1167 clone, up to the implementation address.
const PROXY_PREFIX: [u8; 20] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d,
    0x3d, 0x3d, 0x36, 0x3d, 0x73,
];

/// Creation code suffix of an EIP-1167 clone, after the implementation address.
const PROXY_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// Builds the 55-byte creation code of a minimal proxy delegating to
/// `implementation`.
pub fn minimal_proxy_init_code(implementation: &[u8; 20]) -> Vec<u8> {
    let mut code = Vec::with_capacity(PROXY_PREFIX.len() + 20 + PROXY_SUFFIX.len());
    code.extend_from_slice(&PROXY_PREFIX);
    code.extend_from_slice(implementation);
    code.extend_from_slice(&PROXY_SUFFIX);
    code
}

/// Keccak-256 of the minimal proxy creation code for `implementation`.
///
/// Constant per implementation, so callers deriving many clone addresses
/// compute it once.
pub fn minimal_proxy_code_hash(implementation: &[u8; 20]) -> [u8; 32] {
    Keccak256::digest(minimal_proxy_init_code(implementation)).into()
}

/// Computes `keccak256(0xff ++ deployer ++ salt ++ init_code_hash)[12..]`.
pub fn create2_address(
    deployer: &[u8; 20],
    salt: &[u8; 32],
    init_code_hash: &[u8; 32],
) -> [u8; 20] {
    let mut hasher = Keccak256::new();
    hasher.update([0xffu8]);
    hasher.update(deployer);
    hasher.update(salt);
    hasher.update(init_code_hash);
    let hash = hasher.finalize();

    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    addr
}

/// Predicts where `deployer` places a clone of `implementation` for `salt`.
///
/// Mirrors OpenZeppelin's `Clones.predictDeterministicAddress`. Returns an
/// EIP-55 checksummed address.
pub fn predict_deterministic_address(
    implementation: &str,
    salt: &[u8; 32],
    deployer: &str,
) -> Result<String, EthError> {
    let implementation = parse_address(implementation)?;
    let deployer = parse_address(deployer)?;

    let predicted = create2_address(&deployer, salt, &minimal_proxy_code_hash(&implementation));

    Ok(format_address(&predicted))
}
