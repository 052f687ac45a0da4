//! Normalization of contract-bound integers.
//!
//! Every integer that ends up in a factory call (units, swap method ids,
//! option overrides) passes through [`Quantity`], which holds it as a full
//! 256-bit unsigned value and renders it as a canonical decimal string.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WalletError;

/// An unsigned 256-bit integer headed for the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(U256);

impl Quantity {
    pub const ZERO: Quantity = Quantity(U256::ZERO);

    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Canonical decimal representation, no leading zeros, no separators.
    pub fn to_canonical_string(&self) -> String {
        self.0.to_string()
    }

    /// Narrows to `u64`, naming `what` in the error.
    pub fn to_u64(&self, what: &str) -> Result<u64, WalletError> {
        u64::try_from(self.0)
            .map_err(|_| WalletError::InvalidQuantity(format!("{what} does not fit in u64: {self}")))
    }

    /// Narrows to `u128`, naming `what` in the error.
    pub fn to_u128(&self, what: &str) -> Result<u128, WalletError> {
        u128::try_from(self.0)
            .map_err(|_| WalletError::InvalidQuantity(format!("{what} does not fit in u128: {self}")))
    }
}

/// Parses decimal or `0x`-prefixed hex text into a `U256`.
///
/// Shared with account index parsing, which reports its own error kind.
pub(crate) fn parse_u256(text: &str) -> Result<U256, String> {
    let text = text.trim();

    if text.is_empty() {
        return Err("empty value".into());
    }
    if text.starts_with('-') {
        return Err(format!("negative value {text}"));
    }

    if let Some(hex_digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex_digits.is_empty() || !hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("malformed hex value {text}"));
        }
        return U256::from_str_radix(hex_digits, 16).map_err(|e| format!("{text}: {e}"));
    }

    if !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("not an unsigned integer: {text}"));
    }
    U256::from_str_radix(text, 10).map_err(|e| format!("{text}: {e}"))
}

impl FromStr for Quantity {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u256(s).map(Quantity).map_err(WalletError::InvalidQuantity)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! quantity_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Quantity {
                fn from(value: $t) -> Self {
                    Quantity(U256::from(value))
                }
            }
        )*
    };
}

quantity_from_unsigned!(u8, u16, u32, u64, u128, usize);

impl From<U256> for Quantity {
    fn from(value: U256) -> Self {
        Quantity(value)
    }
}

impl From<Quantity> for U256 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = WalletError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Quantity::from)
            .map_err(|_| WalletError::InvalidQuantity(format!("negative value {value}")))
    }
}

impl TryFrom<&str> for Quantity {
    type Error = WalletError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        quantity_from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Reads a JSON number or numeric string as a [`Quantity`].
pub(crate) fn quantity_from_json(value: &serde_json::Value) -> Result<Quantity, WalletError> {
    match value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(v) => Ok(Quantity::from(v)),
            None => Err(WalletError::InvalidQuantity(format!(
                "not an unsigned integer: {n}"
            ))),
        },
        serde_json::Value::String(s) => s.parse(),
        other => Err(WalletError::InvalidQuantity(format!(
            "expected a number or numeric string, got {other}"
        ))),
    }
}
