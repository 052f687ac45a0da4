use std::fmt;

use chain_eth::address::pubkey_to_eth_address;
use chain_eth::transaction::{sign_transaction, EthTransaction, SignedEthTransaction};
use k256::ecdsa::SigningKey;
use secrecy::{ExposeSecret, SecretBox};
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

/// The secp256k1 identity that authorizes every write a client issues.
///
/// Key bytes live in a [`SecretBox`] and are wiped on drop.
pub struct Signer {
    key: SecretBox<[u8; 32]>,
    address: String,
}

impl Signer {
    /// Builds a signer from raw private key bytes. The input array is wiped.
    pub fn from_bytes(mut bytes: [u8; 32]) -> Result<Self, WalletError> {
        let signer = Self::from_key(&bytes);
        bytes.zeroize();
        signer
    }

    /// Parses a hex private key, with or without `0x`.
    pub fn from_hex(private_key: &str) -> Result<Self, WalletError> {
        let hex_str = private_key
            .trim()
            .strip_prefix("0x")
            .unwrap_or_else(|| private_key.trim());

        let decoded = Zeroizing::new(
            hex::decode(hex_str)
                .map_err(|e| WalletError::Configuration(format!("invalid private key hex: {e}")))?,
        );

        if decoded.len() != 32 {
            return Err(WalletError::Configuration(format!(
                "private key must be 32 bytes, got {}",
                decoded.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(&decoded);
        Self::from_key(&bytes)
    }

    fn from_key(key: &[u8; 32]) -> Result<Self, WalletError> {
        let address = address_of(key)?;
        Ok(Self {
            key: SecretBox::new(Box::new(*key)),
            address,
        })
    }

    /// EIP-55 address of this identity.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn sign(&self, tx: &EthTransaction) -> Result<SignedEthTransaction, WalletError> {
        Ok(sign_transaction(tx, self.key.expose_secret())?)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn address_of(key_bytes: &[u8; 32]) -> Result<String, WalletError> {
    let signing_key = SigningKey::from_bytes(key_bytes.into())
        .map_err(|e| WalletError::Configuration(format!("invalid private key: {e}")))?;

    let public_key: [u8; 65] = signing_key
        .verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .try_into()
        .map_err(|_| WalletError::Configuration("invalid uncompressed public key".into()))?;

    Ok(pubkey_to_eth_address(&public_key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use chain_eth::transaction::{build_contract_call, decode_signed_transaction, FeeModel};

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn address_of_known_key() {
        let signer = Signer::from_hex(KEY_ONE).unwrap();
        assert_eq!(signer.address(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn prefix_is_optional() {
        let signer = Signer::from_hex(&KEY_ONE[2..]).unwrap();
        assert_eq!(signer.address(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(matches!(
            Signer::from_hex("0x1234"),
            Err(WalletError::Configuration(_))
        ));
        assert!(matches!(
            Signer::from_hex("not hex"),
            Err(WalletError::Configuration(_))
        ));
        assert!(matches!(
            Signer::from_bytes([0u8; 32]),
            Err(WalletError::Configuration(_))
        ));
    }

    #[test]
    fn hex_and_raw_keys_give_the_same_identity() {
        let mut raw = [0u8; 32];
        raw[31] = 1;

        let from_raw = Signer::from_bytes(raw).unwrap();
        let from_hex = Signer::from_hex(&format!("  {KEY_ONE}\n")).unwrap();

        assert_eq!(from_raw.address(), from_hex.address());
        assert_eq!(from_raw.key.expose_secret(), from_hex.key.expose_secret());
    }

    #[test]
    fn debug_hides_key_material() {
        let signer = Signer::from_hex(KEY_ONE).unwrap();
        let debug = format!("{signer:?}");

        assert!(debug.contains("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"));
        assert!(!debug.contains("0000000000000001"));
    }

    #[test]
    fn signs_decodable_transactions() {
        let signer = Signer::from_hex(KEY_ONE).unwrap();
        let tx = build_contract_call(
            31337,
            0,
            "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
            vec![0x78, 0x09, 0x00, 0xdc],
            U256::ZERO,
            FeeModel::Dynamic {
                max_priority_fee_per_gas: 1,
                max_fee_per_gas: 2,
            },
            100_000,
        )
        .unwrap();

        let signed = signer.sign(&tx).unwrap();
        let decoded = decode_signed_transaction(&signed.raw_tx).unwrap();
        assert_eq!(decoded.tx, tx);
    }
}
