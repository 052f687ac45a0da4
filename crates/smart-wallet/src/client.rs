use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use chain_eth::address::{format_address, parse_address};
use chain_eth::create2::minimal_proxy_code_hash;
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::channel::{CallRequest, ChannelError, NetworkChannel, TransactionReceipt};
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::factory::{decode_model_account, FactoryCall};
use crate::index::AccountIndex;
use crate::options::TxOptions;
use crate::rpc::HttpChannel;
use crate::signer::Signer;
use crate::types::{PendingTransaction, WalletInfo};

/// Everything a [`WalletClient`] needs besides the factory address.
///
/// All three parts are required; they are optional here only so a missing
/// one is reported as a configuration error instead of a type error.
#[derive(Default)]
pub struct WalletOptions {
    pub signer: Option<Signer>,
    pub channel: Option<Arc<dyn NetworkChannel>>,
    pub model_account: Option<String>,
}

impl WalletOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn channel(mut self, channel: Arc<dyn NetworkChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn model_account(mut self, address: impl Into<String>) -> Self {
        self.model_account = Some(address.into());
        self
    }
}

/// Entry point bound to one deployed wallet factory.
///
/// Immutable after construction. Sub-accounts are derived with
/// [`account`](Self::account) and borrow the client.
pub struct WalletClient {
    signer: Signer,
    channel: Arc<dyn NetworkChannel>,
    factory: String,
    factory_bytes: [u8; 20],
    model_account: String,
    proxy_code_hash: [u8; 32],
}

impl WalletClient {
    pub fn new(factory_address: &str, options: WalletOptions) -> Result<Self, WalletError> {
        let signer = options
            .signer
            .ok_or_else(|| WalletError::Configuration("signing key is required".into()))?;
        let channel = options
            .channel
            .ok_or_else(|| WalletError::Configuration("network channel is required".into()))?;
        let model_account = options
            .model_account
            .ok_or_else(|| WalletError::Configuration("model account is required".into()))?;

        let factory_bytes = parse_config_address("factory address", factory_address)?;
        let model_bytes = parse_config_address("model account", &model_account)?;

        Ok(Self {
            signer,
            channel,
            factory: format_address(&factory_bytes),
            factory_bytes,
            model_account: format_address(&model_bytes),
            proxy_code_hash: minimal_proxy_code_hash(&model_bytes),
        })
    }

    /// Builds a client talking JSON-RPC to `config.provider_url`.
    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        let signer = Signer::from_hex(config.private_key.expose_secret())?;
        let channel = HttpChannel::new(config.provider_url.clone(), config.chain_id);

        Self::new(
            &config.factory_address,
            WalletOptions::new()
                .signer(signer)
                .channel(Arc::new(channel))
                .model_account(config.model_account.clone()),
        )
    }

    /// Reads the factory's own view of its configuration.
    pub async fn info(&self) -> Result<WalletInfo, WalletError> {
        let call = FactoryCall::ModelAccount;
        debug!(factory = %self.factory, %call, "factory read");

        let data = self.read(&self.factory, &call.encode()).await?;
        Ok(WalletInfo {
            model_account: decode_model_account(&data)?,
        })
    }

    /// Derives the sub-account at `index`. No network access.
    pub fn account(&self, index: impl Into<AccountIndex>) -> Account<'_> {
        Account::new(self, index.into())
    }

    /// Like [`account`](Self::account), parsing the index from decimal or
    /// `0x` hex text.
    pub fn try_account(&self, index: &str) -> Result<Account<'_>, WalletError> {
        Ok(self.account(AccountIndex::from_str(index)?))
    }

    pub fn factory_address(&self) -> &str {
        &self.factory
    }

    pub fn model_account(&self) -> &str {
        &self.model_account
    }

    pub fn signer_address(&self) -> &str {
        self.signer.address()
    }

    pub fn channel(&self) -> &Arc<dyn NetworkChannel> {
        &self.channel
    }

    /// Polls until `pending` is mined.
    ///
    /// There is no deadline; wrap the future in `tokio::time::timeout` to
    /// impose one.
    pub async fn wait_for_receipt(
        &self,
        pending: &PendingTransaction,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt, WalletError> {
        loop {
            let receipt = self
                .channel
                .transaction_receipt(&pending.hash)
                .await
                .map_err(WalletError::Network)?;

            match receipt {
                Some(receipt) if receipt.success => return Ok(receipt),
                Some(receipt) => {
                    warn!(
                        hash = %receipt.transaction_hash,
                        block = receipt.block_number,
                        "transaction reverted"
                    );
                    return Err(WalletError::Reverted {
                        hash: receipt.transaction_hash,
                    });
                }
                None => tokio::time::sleep(poll_interval).await,
            }
        }
    }

    pub(crate) fn factory_bytes(&self) -> &[u8; 20] {
        &self.factory_bytes
    }

    pub(crate) fn proxy_code_hash(&self) -> &[u8; 32] {
        &self.proxy_code_hash
    }

    /// Read-only call; failures are [`WalletError::Network`].
    pub(crate) async fn read(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, WalletError> {
        self.channel
            .call(to, data)
            .await
            .map_err(WalletError::Network)
    }

    /// Signs `call` as a transaction to the factory and hands it to the
    /// channel. Returns as soon as the node accepts it.
    ///
    /// `options` go to [`NetworkChannel::fill_transaction`] as given.
    pub(crate) async fn submit(
        &self,
        call: &FactoryCall,
        options: &TxOptions,
    ) -> Result<PendingTransaction, WalletError> {
        if !call.is_write() {
            return Err(WalletError::Encoding(format!(
                "{} is a read, not a transaction",
                call.signature()
            )));
        }
        debug!(factory = %self.factory, %call, "factory write");

        let request = CallRequest {
            from: self.signer.address().to_string(),
            to: self.factory.clone(),
            data: call.encode(),
            value: U256::ZERO,
        };

        let tx = self
            .channel
            .fill_transaction(&request, options)
            .await
            .map_err(submission_error)?;
        let signed = self.signer.sign(&tx)?;

        let hash = self
            .channel
            .send_raw_transaction(&signed.raw_tx)
            .await
            .map_err(WalletError::Submission)?;

        if !hash.eq_ignore_ascii_case(&signed.tx_hash) {
            warn!(reported = %hash, computed = %signed.tx_hash, "node reported a different hash");
        }
        info!(
            %hash,
            nonce = tx.nonce,
            gas_limit = tx.gas_limit,
            legacy = tx.is_legacy(),
            "transaction accepted"
        );

        Ok(PendingTransaction {
            hash,
            nonce: tx.nonce,
        })
    }
}

impl fmt::Debug for WalletClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletClient")
            .field("factory", &self.factory)
            .field("model_account", &self.model_account)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

fn submission_error(error: ChannelError) -> WalletError {
    match error {
        ChannelError::InvalidOptions(message) => WalletError::InvalidOptions(message),
        other => WalletError::Submission(other),
    }
}

fn parse_config_address(what: &str, address: &str) -> Result<[u8; 20], WalletError> {
    parse_address(address).map_err(|e| WalletError::Configuration(format!("{what}: {e}")))
}
