//! Calldata for the wallet factory contract.
//!
//! Factory interface:
//!
//! ```text
//! modelAccount() -> address
//! get(uint256 index) -> (address account, bool exists, bytes32 salt)
//! create(uint256 index)
//! transfer(uint256 index, address recipient, address asset, uint256 units)
//! swap(uint256 index, uint256 method, address router, uint256 unitsIn,
//!      uint256 unitsOutMin, address[] path, address to)
//! ```

use std::fmt;

use chain_eth::abi::{
    decode_address, decode_address_array, decode_bool, decode_uint256, decode_word,
    encode_function_call, function_selector, AbiParam,
};
use chain_eth::address::format_address;

use crate::error::WalletError;
use crate::index::AccountIndex;
use crate::types::AccountInfo;
use crate::units::Quantity;

const MODEL_ACCOUNT_SIG: &str = "modelAccount()";
const GET_SIG: &str = "get(uint256)";
const CREATE_SIG: &str = "create(uint256)";
const TRANSFER_SIG: &str = "transfer(uint256,address,address,uint256)";
const SWAP_SIG: &str = "swap(uint256,uint256,address,uint256,uint256,address[],address)";

/// One call into the factory, with every argument already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryCall {
    ModelAccount,
    Get {
        index: AccountIndex,
    },
    Create {
        index: AccountIndex,
    },
    Transfer {
        index: AccountIndex,
        recipient: [u8; 20],
        /// Zero address for the native currency.
        asset: [u8; 20],
        units: Quantity,
    },
    Swap {
        index: AccountIndex,
        method: Quantity,
        router: [u8; 20],
        units_in: Quantity,
        units_out_min: Quantity,
        path: Vec<[u8; 20]>,
        to: [u8; 20],
    },
}

impl FactoryCall {
    /// Canonical Solidity signature of the function this call targets.
    pub fn signature(&self) -> &'static str {
        match self {
            FactoryCall::ModelAccount => MODEL_ACCOUNT_SIG,
            FactoryCall::Get { .. } => GET_SIG,
            FactoryCall::Create { .. } => CREATE_SIG,
            FactoryCall::Transfer { .. } => TRANSFER_SIG,
            FactoryCall::Swap { .. } => SWAP_SIG,
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        function_selector(self.signature())
    }

    /// Whether the call changes state and must be sent as a transaction.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            FactoryCall::Create { .. } | FactoryCall::Transfer { .. } | FactoryCall::Swap { .. }
        )
    }

    pub fn encode(&self) -> Vec<u8> {
        let params = match self {
            FactoryCall::ModelAccount => vec![],
            FactoryCall::Get { index } | FactoryCall::Create { index } => {
                vec![AbiParam::Uint256(index.as_u256())]
            }
            FactoryCall::Transfer {
                index,
                recipient,
                asset,
                units,
            } => vec![
                AbiParam::Uint256(index.as_u256()),
                AbiParam::Address(*recipient),
                AbiParam::Address(*asset),
                AbiParam::Uint256(units.as_u256()),
            ],
            FactoryCall::Swap {
                index,
                method,
                router,
                units_in,
                units_out_min,
                path,
                to,
            } => vec![
                AbiParam::Uint256(index.as_u256()),
                AbiParam::Uint256(method.as_u256()),
                AbiParam::Address(*router),
                AbiParam::Uint256(units_in.as_u256()),
                AbiParam::Uint256(units_out_min.as_u256()),
                AbiParam::AddressArray(path.clone()),
                AbiParam::Address(*to),
            ],
        };

        encode_function_call(self.selector(), &params)
    }

    /// Reads factory calldata back into a call.
    pub fn decode(calldata: &[u8]) -> Result<Self, WalletError> {
        if calldata.len() < 4 {
            return Err(WalletError::Encoding(format!(
                "calldata too short for a selector: {} bytes",
                calldata.len()
            )));
        }

        let (selector, args) = calldata.split_at(4);
        let index = || decode_uint256(args, 0).map(AccountIndex::from);

        let call = if selector == function_selector(MODEL_ACCOUNT_SIG) {
            FactoryCall::ModelAccount
        } else if selector == function_selector(GET_SIG) {
            FactoryCall::Get { index: index()? }
        } else if selector == function_selector(CREATE_SIG) {
            FactoryCall::Create { index: index()? }
        } else if selector == function_selector(TRANSFER_SIG) {
            FactoryCall::Transfer {
                index: index()?,
                recipient: decode_address(args, 1)?,
                asset: decode_address(args, 2)?,
                units: decode_uint256(args, 3)?.into(),
            }
        } else if selector == function_selector(SWAP_SIG) {
            FactoryCall::Swap {
                index: index()?,
                method: decode_uint256(args, 1)?.into(),
                router: decode_address(args, 2)?,
                units_in: decode_uint256(args, 3)?.into(),
                units_out_min: decode_uint256(args, 4)?.into(),
                path: decode_address_array(args, 5)?,
                to: decode_address(args, 6)?,
            }
        } else {
            return Err(WalletError::Encoding(format!(
                "unknown factory selector 0x{}",
                hex::encode(selector)
            )));
        };

        Ok(call)
    }
}

impl fmt::Display for FactoryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryCall::ModelAccount => write!(f, "modelAccount()"),
            FactoryCall::Get { index } => write!(f, "get({index})"),
            FactoryCall::Create { index } => write!(f, "create({index})"),
            FactoryCall::Transfer {
                index,
                recipient,
                asset,
                units,
            } => write!(
                f,
                "transfer({index}, {}, {}, {units})",
                format_address(recipient),
                format_address(asset)
            ),
            FactoryCall::Swap {
                index,
                method,
                router,
                units_in,
                units_out_min,
                path,
                to,
            } => {
                let path: Vec<String> = path.iter().map(format_address).collect();
                write!(
                    f,
                    "swap({index}, {method}, {}, {units_in}, {units_out_min}, [{}], {})",
                    format_address(router),
                    path.join(", "),
                    format_address(to)
                )
            }
        }
    }
}

/// Decodes the return data of `modelAccount()`.
pub fn decode_model_account(data: &[u8]) -> Result<String, WalletError> {
    Ok(format_address(&decode_address(data, 0)?))
}

/// Decodes the return data of `get(uint256)`.
pub fn decode_account_info(data: &[u8]) -> Result<AccountInfo, WalletError> {
    let address = decode_address(data, 0)?;
    let exists = decode_bool(data, 1)?;
    let salt = decode_word(data, 2)?;

    Ok(AccountInfo {
        address: format_address(&address),
        exists,
        salt: format!("0x{}", hex::encode(salt)),
    })
}

/// Encodes the return data of `get(uint256)`, as the factory would.
pub fn encode_account_info(address: &[u8; 20], exists: bool, salt: [u8; 32]) -> Vec<u8> {
    let mut data = encode_function_call(
        [0u8; 4],
        &[
            AbiParam::Address(*address),
            AbiParam::Bool(exists),
            AbiParam::FixedBytes32(salt),
        ],
    );
    data.drain(..4);
    data
}
