use chain_eth::address::{format_address, is_zero_address, parse_address, validate_address};
use chain_eth::create2::create2_address;
use chain_eth::erc20;
use tracing::debug;

use crate::channel::ChannelError;
use crate::client::WalletClient;
use crate::error::WalletError;
use crate::factory::{decode_account_info, FactoryCall};
use crate::index::AccountIndex;
use crate::options::TxOptions;
use crate::types::{AccountInfo, Balance, PendingTransaction, SwapRequest, TransferRequest, NATIVE_DECIMALS};

/// One sub-account of a factory, identified by its index.
///
/// The address is the CREATE2 location of the model account's minimal
/// proxy clone, so it is known before the account is ever deployed.
#[derive(Debug, Clone)]
pub struct Account<'a> {
    client: &'a WalletClient,
    index: AccountIndex,
    address: String,
}

impl<'a> Account<'a> {
    pub(crate) fn new(client: &'a WalletClient, index: AccountIndex) -> Self {
        let predicted = create2_address(client.factory_bytes(), &index.salt(), client.proxy_code_hash());

        Self {
            client,
            index,
            address: format_address(&predicted),
        }
    }

    pub fn index(&self) -> AccountIndex {
        self.index
    }

    /// Predicted EIP-55 address of the clone.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn salt(&self) -> [u8; 32] {
        self.index.salt()
    }

    pub fn salt_hex(&self) -> String {
        self.index.salt_hex()
    }

    pub fn client(&self) -> &'a WalletClient {
        self.client
    }

    /// Asks the factory about this index.
    pub async fn info(&self) -> Result<AccountInfo, WalletError> {
        let call = FactoryCall::Get { index: self.index };
        debug!(factory = %self.client.factory_address(), %call, "factory read");

        let data = self
            .client
            .read(self.client.factory_address(), &call.encode())
            .await?;
        decode_account_info(&data)
    }

    /// Balance of `asset` held by this account, in the asset's smallest unit.
    ///
    /// `None` or the zero address selects the native currency.
    pub async fn balance(&self, asset: Option<&str>) -> Result<Balance, WalletError> {
        let holder = self.info().await?.address;

        if is_zero_address(asset) {
            let units = self
                .client
                .channel()
                .balance(&holder)
                .await
                .map_err(WalletError::Network)?;

            return Ok(Balance {
                units,
                decimals: NATIVE_DECIMALS,
            });
        }

        let token = format_address(&address_arg(asset.unwrap_or_default())?);
        let balance_call = erc20::encode_balance_of(&holder)?;
        let decimals_call = erc20::encode_decimals();

        let (balance_data, decimals_data) = tokio::try_join!(
            self.token_read(&token, &balance_call),
            self.token_read(&token, &decimals_call),
        )?;

        let units = erc20::decode_balance(&balance_data)
            .map_err(|e| unsupported(&token, e.to_string()))?;
        let decimals = erc20::decode_decimals(&decimals_data)
            .map_err(|e| unsupported(&token, e.to_string()))?;

        Ok(Balance { units, decimals })
    }

    /// Deploys the clone. The factory decides what happens if it already
    /// exists.
    pub async fn create(&self, options: &TxOptions) -> Result<PendingTransaction, WalletError> {
        self.client
            .submit(&FactoryCall::Create { index: self.index }, options)
            .await
    }

    pub async fn transfer(
        &self,
        request: &TransferRequest,
        options: &TxOptions,
    ) -> Result<PendingTransaction, WalletError> {
        let asset = if is_zero_address(request.asset.as_deref()) {
            [0u8; 20]
        } else {
            address_arg(request.asset.as_deref().unwrap_or_default())?
        };

        let call = FactoryCall::Transfer {
            index: self.index,
            recipient: address_arg(&request.recipient)?,
            asset,
            units: request.units,
        };
        self.client.submit(&call, options).await
    }

    /// Routes a swap through `request.router`. Router, path and recipient
    /// are passed on as given once they parse as addresses.
    pub async fn swap(
        &self,
        request: &SwapRequest,
        options: &TxOptions,
    ) -> Result<PendingTransaction, WalletError> {
        let path = request
            .path
            .iter()
            .map(|hop| address_arg(hop))
            .collect::<Result<Vec<_>, _>>()?;

        let call = FactoryCall::Swap {
            index: self.index,
            method: request.method,
            router: address_arg(&request.router)?,
            units_in: request.units_in,
            units_out_min: request.units_out_min,
            path,
            to: address_arg(&request.to)?,
        };
        self.client.submit(&call, options).await
    }

    async fn token_read(&self, token: &str, data: &[u8]) -> Result<Vec<u8>, WalletError> {
        match self.client.channel().call(token, data).await {
            Ok(bytes) if bytes.is_empty() => Err(unsupported(token, "empty return data")),
            Ok(bytes) => Ok(bytes),
            Err(e) if e.is_execution_revert() => Err(unsupported(token, revert_reason(&e))),
            Err(e) => Err(WalletError::Network(e)),
        }
    }
}

/// Parses a caller-supplied address. Mixed-case input must carry a valid
/// EIP-55 checksum.
fn address_arg(address: &str) -> Result<[u8; 20], WalletError> {
    if !validate_address(address)? {
        return Err(WalletError::InvalidAddress(format!("checksum mismatch: {address}")));
    }
    Ok(parse_address(address)?)
}

fn unsupported(asset: &str, reason: impl Into<String>) -> WalletError {
    WalletError::UnsupportedAsset {
        asset: asset.to_string(),
        reason: reason.into(),
    }
}

fn revert_reason(error: &ChannelError) -> String {
    match error {
        ChannelError::Rpc { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
