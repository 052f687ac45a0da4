use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::address::{format_address, parse_address};
use crate::error::EthError;

/// EIP-2718 type byte of an EIP-1559 transaction.
const EIP1559_TX_TYPE: u8 = 0x02;

/// How a transaction pays for gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeModel {
    /// EIP-155 legacy transaction paying a flat price per gas.
    Legacy { gas_price: u128 },
    /// EIP-1559 (type 2) transaction.
    Dynamic {
        max_priority_fee_per_gas: u128,
        max_fee_per_gas: u128,
    },
}

/// An EIP-2930 access list entry.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

/// An unsigned Ethereum transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub fees: FeeModel,
    pub gas_limit: u64,
    /// Recipient address as a 0x-prefixed hex string.
    pub to: String,
    /// Native value attached to the call, in wei.
    pub value: U256,
    /// Calldata.
    pub data: Vec<u8>,
    /// Only type 2 transactions carry one; must be empty for legacy.
    pub access_list: Vec<AccessListItem>,
}

impl EthTransaction {
    pub fn is_legacy(&self) -> bool {
        matches!(self.fees, FeeModel::Legacy { .. })
    }
}

/// A signed Ethereum transaction ready for broadcast.
pub struct SignedEthTransaction {
    /// Signed transaction bytes (type prefix included for type 2).
    pub raw_tx: Vec<u8>,
    /// Transaction hash as a 0x-prefixed hex string.
    pub tx_hash: String,
}

/// A signed transaction read back from its raw bytes.
#[derive(Debug, Clone)]
pub struct DecodedEthTransaction {
    pub tx: EthTransaction,
    pub y_parity: u8,
    pub r: U256,
    pub s: U256,
    /// Transaction hash as a 0x-prefixed hex string.
    pub tx_hash: String,
}

/// Builds an unsigned contract call with an empty access list.
pub fn build_contract_call(
    chain_id: u64,
    nonce: u64,
    contract: &str,
    data: Vec<u8>,
    value: U256,
    fees: FeeModel,
    gas_limit: u64,
) -> Result<EthTransaction, EthError> {
    let to = parse_address(contract)?;

    if let FeeModel::Dynamic {
        max_priority_fee_per_gas,
        max_fee_per_gas,
    } = fees
    {
        if max_priority_fee_per_gas > max_fee_per_gas {
            return Err(EthError::TransactionBuildError(format!(
                "priority fee {max_priority_fee_per_gas} exceeds max fee {max_fee_per_gas}"
            )));
        }
    }

    Ok(EthTransaction {
        chain_id,
        nonce,
        fees,
        gas_limit,
        to: format_address(&to),
        value,
        data,
        access_list: Vec::new(),
    })
}

/// Signs the transaction's signing payload and appends the signature.
///
/// Type 2 transactions sign `keccak256(0x02 || rlp(fields))` and carry
/// `y_parity`. Legacy ones sign the EIP-155 list and fold the chain id into
/// `v`. The key copy is wiped.
pub fn sign_transaction(
    tx: &EthTransaction,
    private_key: &[u8; 32],
) -> Result<SignedEthTransaction, EthError> {
    let unsigned_payload = encode_unsigned_tx(tx)?;
    let msg_hash = Keccak256::digest(&unsigned_payload);

    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    let signing_key = signing_key?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(msg_hash.as_slice())
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let y_parity = recovery_id.is_y_odd() as u8;
    let r = U256::from_be_slice(&signature.r().to_bytes());
    let s = U256::from_be_slice(&signature.s().to_bytes());
    let to = rlp_address(&tx.to)?;

    let raw_tx = match tx.fees {
        FeeModel::Legacy { gas_price } => {
            let fields = LegacySignedFields {
                nonce: tx.nonce,
                gas_price,
                gas_limit: tx.gas_limit,
                to,
                value: tx.value,
                data: Bytes::from(tx.data.clone()),
                v: eip155_v(tx.chain_id, y_parity)?,
                r,
                s,
            };
            rlp_list(&fields)
        }
        FeeModel::Dynamic {
            max_priority_fee_per_gas,
            max_fee_per_gas,
        } => {
            let fields = SignedTxFields {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                max_priority_fee_per_gas,
                max_fee_per_gas,
                gas_limit: tx.gas_limit,
                to,
                value: tx.value,
                data: Bytes::from(tx.data.clone()),
                access_list: tx.access_list.clone(),
                signature_y_parity: y_parity,
                signature_r: r,
                signature_s: s,
            };
            with_type_prefix(&fields)
        }
    };
    let tx_hash = format!("0x{}", hex::encode(Keccak256::digest(&raw_tx)));

    Ok(SignedEthTransaction { raw_tx, tx_hash })
}

/// Encodes the payload whose hash gets signed.
///
/// Type 2: `0x02 || rlp([chain_id, nonce, max_priority_fee_per_gas,
/// max_fee_per_gas, gas_limit, to, value, data, access_list])`.
/// Legacy: `rlp([nonce, gas_price, gas_limit, to, value, data, chain_id, 0, 0])`.
pub fn encode_unsigned_tx(tx: &EthTransaction) -> Result<Vec<u8>, EthError> {
    let to = rlp_address(&tx.to)?;

    match tx.fees {
        FeeModel::Legacy { gas_price } => {
            if !tx.access_list.is_empty() {
                return Err(EthError::TransactionBuildError(
                    "legacy transactions cannot carry an access list".into(),
                ));
            }
            let fields = LegacyUnsignedFields {
                nonce: tx.nonce,
                gas_price,
                gas_limit: tx.gas_limit,
                to,
                value: tx.value,
                data: Bytes::from(tx.data.clone()),
                chain_id: tx.chain_id,
                empty_r: 0,
                empty_s: 0,
            };
            Ok(rlp_list(&fields))
        }
        FeeModel::Dynamic {
            max_priority_fee_per_gas,
            max_fee_per_gas,
        } => {
            let fields = UnsignedTxFields {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                max_priority_fee_per_gas,
                max_fee_per_gas,
                gas_limit: tx.gas_limit,
                to,
                value: tx.value,
                data: Bytes::from(tx.data.clone()),
                access_list: tx.access_list.clone(),
            };
            Ok(with_type_prefix(&fields))
        }
    }
}

/// Decodes a signed legacy (EIP-155) or type 2 transaction from its raw
/// broadcast bytes.
pub fn decode_signed_transaction(raw_tx: &[u8]) -> Result<DecodedEthTransaction, EthError> {
    let (&first, typed_body) = raw_tx
        .split_first()
        .ok_or_else(|| EthError::DecodingError("empty transaction".into()))?;

    // An RLP list header means a legacy transaction.
    let (tx, y_parity, r, s, rest) = if first >= 0xc0 {
        let mut body = raw_tx;
        let fields = LegacySignedFields::decode(&mut body)
            .map_err(|e| EthError::DecodingError(e.to_string()))?;
        let (chain_id, y_parity) = split_eip155_v(fields.v)?;

        let tx = EthTransaction {
            chain_id,
            nonce: fields.nonce,
            fees: FeeModel::Legacy {
                gas_price: fields.gas_price,
            },
            gas_limit: fields.gas_limit,
            to: format_address(&fields.to.into_array()),
            value: fields.value,
            data: fields.data.to_vec(),
            access_list: Vec::new(),
        };
        (tx, y_parity, fields.r, fields.s, body)
    } else if first == EIP1559_TX_TYPE {
        let mut body = typed_body;
        let fields = SignedTxFields::decode(&mut body)
            .map_err(|e| EthError::DecodingError(e.to_string()))?;

        let tx = EthTransaction {
            chain_id: fields.chain_id,
            nonce: fields.nonce,
            fees: FeeModel::Dynamic {
                max_priority_fee_per_gas: fields.max_priority_fee_per_gas,
                max_fee_per_gas: fields.max_fee_per_gas,
            },
            gas_limit: fields.gas_limit,
            to: format_address(&fields.to.into_array()),
            value: fields.value,
            data: fields.data.to_vec(),
            access_list: fields.access_list,
        };
        (
            tx,
            fields.signature_y_parity,
            fields.signature_r,
            fields.signature_s,
            body,
        )
    } else {
        return Err(EthError::DecodingError(format!(
            "unsupported transaction type 0x{first:02x}"
        )));
    };

    if !rest.is_empty() {
        return Err(EthError::DecodingError(format!(
            "{} trailing bytes after transaction",
            rest.len()
        )));
    }

    Ok(DecodedEthTransaction {
        tx,
        y_parity,
        r,
        s,
        tx_hash: format!("0x{}", hex::encode(Keccak256::digest(raw_tx))),
    })
}

// ---------------------------------------------------------------------------
// RLP structures
// ---------------------------------------------------------------------------

/// Unsigned EIP-1559 transaction fields for RLP encoding.
#[derive(RlpEncodable)]
struct UnsignedTxFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    access_list: Vec<AccessListItem>,
}

/// Signed EIP-1559 transaction fields.
#[derive(RlpEncodable, RlpDecodable)]
struct SignedTxFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    access_list: Vec<AccessListItem>,
    signature_y_parity: u8,
    signature_r: U256,
    signature_s: U256,
}

/// EIP-155 signing list; the trailing zeros stand in for `r` and `s`.
#[derive(RlpEncodable)]
struct LegacyUnsignedFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    chain_id: u64,
    empty_r: u8,
    empty_s: u8,
}

#[derive(RlpEncodable, RlpDecodable)]
struct LegacySignedFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rlp_address(address: &str) -> Result<Address, EthError> {
    parse_address(address).map(Address::from)
}

fn rlp_list<T: Encodable>(fields: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(fields.length());
    fields.encode(&mut out);
    out
}

fn with_type_prefix<T: Encodable>(fields: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + fields.length());
    out.push(EIP1559_TX_TYPE);
    fields.encode(&mut out);
    out
}

/// `v = chain_id * 2 + 35 + y_parity`
fn eip155_v(chain_id: u64, y_parity: u8) -> Result<u64, EthError> {
    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(35 + u64::from(y_parity)))
        .ok_or_else(|| {
            EthError::TransactionBuildError(format!("chain id {chain_id} too large for EIP-155"))
        })
}

fn split_eip155_v(v: u64) -> Result<(u64, u8), EthError> {
    if v < 35 {
        return Err(EthError::DecodingError(format!(
            "v = {v} is not an EIP-155 signature"
        )));
    }
    Ok(((v - 35) / 2, ((v - 35) % 2) as u8))
}
