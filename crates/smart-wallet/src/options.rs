//! Per-transaction options.
//!
//! [`TxOptions`] travel from the account to the [`NetworkChannel`] untouched;
//! the library never rejects a key it does not know. The channel decides
//! what they mean. Its default, [`fill_transaction`], understands the usual
//! override names: `gasLimit`, `nonce`, `value`, `type`, `gasPrice`,
//! `maxFeePerGas`, `maxPriorityFeePerGas` and `accessList`. Numeric values
//! may be JSON numbers or decimal/hex strings. Other keys are left alone.

use alloy_primitives::{Address, B256, U256};
use chain_eth::transaction::{build_contract_call, AccessListItem, EthTransaction, FeeModel};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::channel::{CallRequest, ChannelError, FeeData, NetworkChannel};
use crate::error::WalletError;
use crate::units::{quantity_from_json, Quantity};

/// Priority fee used when the node offers no suggestion: 1.5 gwei.
pub const DEFAULT_PRIORITY_FEE: u128 = 1_500_000_000;

const LEGACY_TX_TYPE: u64 = 0;
const DYNAMIC_TX_TYPE: u64 = 2;

const KNOWN_KEYS: [&str; 8] = [
    "gasLimit",
    "nonce",
    "value",
    "type",
    "gasPrice",
    "maxFeePerGas",
    "maxPriorityFeePerGas",
    "accessList",
];

/// Opaque key-value transaction options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxOptions(Map<String, Value>);

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for TxOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The keys [`fill_transaction`] acts on, after interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TxOverrides {
    pub legacy: bool,
    pub gas_limit: Option<u64>,
    pub nonce: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub gas_price: Option<u128>,
    pub value: Option<U256>,
    pub access_list: Vec<AccessListItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessListEntry {
    address: Address,
    #[serde(default)]
    storage_keys: Vec<B256>,
}

impl TxOverrides {
    pub fn parse(options: &TxOptions) -> Result<Self, ChannelError> {
        let mut overrides = TxOverrides {
            gas_limit: narrow(options, "gasLimit", |q, k| q.to_u64(k))?,
            nonce: narrow(options, "nonce", |q, k| q.to_u64(k))?,
            max_fee_per_gas: narrow(options, "maxFeePerGas", |q, k| q.to_u128(k))?,
            max_priority_fee_per_gas: narrow(options, "maxPriorityFeePerGas", |q, k| {
                q.to_u128(k)
            })?,
            gas_price: narrow(options, "gasPrice", |q, k| q.to_u128(k))?,
            value: narrow(options, "value", |q, _| Ok(q.as_u256()))?,
            ..Default::default()
        };

        if let Some(raw) = options.get("accessList") {
            let entries: Vec<AccessListEntry> = serde_json::from_value(raw.clone())
                .map_err(|e| invalid(format!("accessList: {e}")))?;
            overrides.access_list = entries
                .into_iter()
                .map(|entry| AccessListItem {
                    address: entry.address,
                    storage_keys: entry.storage_keys,
                })
                .collect();
        }

        let has_dynamic_fees =
            overrides.max_fee_per_gas.is_some() || overrides.max_priority_fee_per_gas.is_some();

        let tx_type = narrow(options, "type", |q, k| q.to_u64(k))?;
        overrides.legacy = match tx_type {
            Some(LEGACY_TX_TYPE) => true,
            Some(DYNAMIC_TX_TYPE) => false,
            Some(other) => return Err(invalid(format!("unsupported transaction type {other}"))),
            None => overrides.gas_price.is_some() && !has_dynamic_fees,
        };

        if overrides.legacy && (has_dynamic_fees || !overrides.access_list.is_empty()) {
            return Err(invalid(
                "legacy transactions take gasPrice only, without an access list".into(),
            ));
        }
        if !overrides.legacy && overrides.gas_price.is_some() {
            return Err(invalid(
                "gasPrice cannot be combined with EIP-1559 fee options".into(),
            ));
        }

        Ok(overrides)
    }

    /// Whether fees are fully specified, so the chain need not be asked.
    pub fn has_fees(&self) -> bool {
        if self.legacy {
            self.gas_price.is_some()
        } else {
            self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
        }
    }

    /// Resolves what the transaction pays for gas.
    ///
    /// Legacy transactions pay `gasPrice`, else the node's gas price.
    /// Otherwise missing values come from `fee_data`: priority defaults to
    /// the node suggestion or [`DEFAULT_PRIORITY_FEE`], max fee to twice the
    /// base fee plus priority.
    pub fn resolve_fees(&self, fee_data: Option<&FeeData>) -> FeeModel {
        if self.legacy {
            let gas_price = self
                .gas_price
                .or(fee_data.map(|f| f.gas_price))
                .unwrap_or_default();
            return FeeModel::Legacy { gas_price };
        }

        let suggested_priority = fee_data
            .and_then(|f| f.max_priority_fee_per_gas)
            .unwrap_or(DEFAULT_PRIORITY_FEE);
        let priority = self.max_priority_fee_per_gas.unwrap_or(suggested_priority);

        let max_fee = self.max_fee_per_gas.unwrap_or_else(|| match fee_data {
            Some(FeeData {
                base_fee_per_gas: Some(base),
                ..
            }) => base.saturating_mul(2).saturating_add(priority),
            Some(f) => f.gas_price.max(priority),
            None => priority,
        });

        FeeModel::Dynamic {
            max_priority_fee_per_gas: priority.min(max_fee),
            max_fee_per_gas: max_fee,
        }
    }
}

/// Completes `request` into a transaction ready for signing.
///
/// Whatever `options` set is used as given; the rest comes from `channel`.
/// This is what [`NetworkChannel::fill_transaction`] does unless a channel
/// overrides it.
pub async fn fill_transaction<C>(
    channel: &C,
    request: &CallRequest,
    options: &TxOptions,
) -> Result<EthTransaction, ChannelError>
where
    C: NetworkChannel + ?Sized,
{
    let overrides = TxOverrides::parse(options)?;
    for key in options.as_map().keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            debug!(%key, "option left to the channel");
        }
    }

    let request = CallRequest {
        value: overrides.value.unwrap_or(request.value),
        ..request.clone()
    };

    let chain_id = channel.chain_id().await?;

    let nonce = match overrides.nonce {
        Some(nonce) => nonce,
        None => channel.transaction_count(&request.from).await?,
    };

    let gas_limit = match overrides.gas_limit {
        Some(gas) => gas,
        None => channel.estimate_gas(&request).await?,
    };

    let fee_data = if overrides.has_fees() {
        None
    } else {
        Some(channel.fee_data().await?)
    };
    let fees = overrides.resolve_fees(fee_data.as_ref());

    let mut tx = build_contract_call(
        chain_id,
        nonce,
        &request.to,
        request.data,
        request.value,
        fees,
        gas_limit,
    )
    .map_err(|e| invalid(e.to_string()))?;
    tx.access_list = overrides.access_list;

    Ok(tx)
}

fn narrow<T>(
    options: &TxOptions,
    key: &str,
    convert: impl Fn(Quantity, &str) -> Result<T, WalletError>,
) -> Result<Option<T>, ChannelError> {
    options
        .get(key)
        .map(|raw| {
            quantity_from_json(raw)
                .and_then(|quantity| convert(quantity, key))
                .map_err(|e| invalid(format!("{key}: {e}")))
        })
        .transpose()
}

fn invalid(message: String) -> ChannelError {
    ChannelError::InvalidOptions(message)
}
