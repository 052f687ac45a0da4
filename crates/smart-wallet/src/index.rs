use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::units::parse_u256;

/// Slot number of a sub-account under the factory.
///
/// Indices need not be sequential or previously used. The same index always
/// maps to the same salt and therefore the same deployed address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountIndex(U256);

impl AccountIndex {
    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// CREATE2 salt: the index as a 32-byte big-endian word.
    pub fn salt(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    /// The salt as `0x` followed by 64 lowercase hex digits.
    pub fn salt_hex(&self) -> String {
        format!("0x{}", hex::encode(self.salt()))
    }
}

impl fmt::Display for AccountIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountIndex {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u256(s).map(AccountIndex).map_err(WalletError::InvalidIndex)
    }
}

macro_rules! index_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AccountIndex {
                fn from(value: $t) -> Self {
                    AccountIndex(U256::from(value))
                }
            }
        )*
    };
}

index_from_unsigned!(u8, u16, u32, u64, u128, usize);

impl From<U256> for AccountIndex {
    fn from(value: U256) -> Self {
        AccountIndex(value)
    }
}

impl TryFrom<i64> for AccountIndex {
    type Error = WalletError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(AccountIndex::from)
            .map_err(|_| WalletError::InvalidIndex(format!("negative index {value}")))
    }
}
