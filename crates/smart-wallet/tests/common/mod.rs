//! In-memory chain emulating the wallet factory and ERC-20 tokens.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy_primitives::U256;
use async_trait::async_trait;
use chain_eth::abi::{encode_function_call, function_selector, AbiParam};
use chain_eth::address::{format_address, parse_address};
use chain_eth::create2::{create2_address, minimal_proxy_code_hash};
use chain_eth::transaction::{decode_signed_transaction, EthTransaction};
use smart_wallet::factory::{encode_account_info, FactoryCall};
use smart_wallet::options::fill_transaction;
use smart_wallet::{
    AccountIndex, CallRequest, ChannelError, FeeData, NetworkChannel, Signer, TransactionReceipt,
    TxOptions, WalletClient, WalletOptions,
};

pub const FACTORY: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
pub const MODEL: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const CHAIN_ID: u64 = 31337;
/// First anvil development key.
pub const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const USDC: &str = "0x5FC8d32690cc91D4c39d9d3abcBD16989F875707";
pub const GAS_ESTIMATE: u64 = 90_000;
pub const BASE_FEE: u128 = 1_000_000_000;
pub const NODE_PRIORITY_FEE: u128 = 2_000_000_000;

/// A transaction the mock accepted, with the factory call it carried.
#[derive(Debug, Clone)]
pub struct SentTransaction {
    pub tx: EthTransaction,
    pub call: FactoryCall,
    pub hash: String,
}

#[derive(Default)]
struct Token {
    decimals: u8,
    balances: HashMap<[u8; 20], U256>,
}

#[derive(Default)]
struct State {
    deployed: HashSet<AccountIndex>,
    native: HashMap<[u8; 20], U256>,
    tokens: HashMap<[u8; 20], Token>,
    reverting: HashSet<[u8; 20]>,
    nonce: u64,
    sent: Vec<SentTransaction>,
    receipts: HashMap<String, TransactionReceipt>,
    reads: Vec<String>,
    options: Vec<TxOptions>,
    send_failure: Option<ChannelError>,
    call_failure: Option<ChannelError>,
    reverted_next: bool,
}

pub struct MockChannel {
    factory: [u8; 20],
    model: [u8; 20],
    proxy_hash: [u8; 32],
    state: Mutex<State>,
}

impl MockChannel {
    pub fn new() -> Self {
        let factory = parse_address(FACTORY).unwrap();
        let model = parse_address(MODEL).unwrap();

        Self {
            factory,
            model,
            proxy_hash: minimal_proxy_code_hash(&model),
            state: Mutex::new(State::default()),
        }
    }

    pub fn clone_address(&self, index: AccountIndex) -> [u8; 20] {
        create2_address(&self.factory, &index.salt(), &self.proxy_hash)
    }

    pub fn set_native_balance(&self, holder: &str, units: U256) {
        self.state()
            .native
            .insert(parse_address(holder).unwrap(), units);
    }

    pub fn add_token(&self, token: &str, decimals: u8) {
        self.state().tokens.insert(
            parse_address(token).unwrap(),
            Token {
                decimals,
                ..Default::default()
            },
        );
    }

    pub fn set_token_balance(&self, token: &str, holder: &str, units: U256) {
        let mut state = self.state();
        let token = state
            .tokens
            .get_mut(&parse_address(token).unwrap())
            .expect("token registered");
        token.balances.insert(parse_address(holder).unwrap(), units);
    }

    /// Every call to `contract` reverts from now on.
    pub fn revert_calls_to(&self, contract: &str) {
        self.state().reverting.insert(parse_address(contract).unwrap());
    }

    pub fn fail_next_send(&self, error: ChannelError) {
        self.state().send_failure = Some(error);
    }

    pub fn fail_calls(&self, error: ChannelError) {
        self.state().call_failure = Some(error);
    }

    /// The next accepted transaction gets a failed receipt.
    pub fn revert_next_transaction(&self) {
        self.state().reverted_next = true;
    }

    pub fn sent(&self) -> Vec<SentTransaction> {
        self.state().sent.clone()
    }

    pub fn last_call(&self) -> FactoryCall {
        self.state().sent.last().expect("a transaction was sent").call.clone()
    }

    /// Options handed to `fill_transaction`, in order.
    pub fn received_options(&self) -> Vec<TxOptions> {
        self.state().options.clone()
    }

    /// Targets of every `eth_call`, checksummed.
    pub fn reads(&self) -> Vec<String> {
        self.state().reads.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn factory_read(&self, state: &State, call: FactoryCall) -> Vec<u8> {
        match call {
            FactoryCall::ModelAccount => {
                strip_selector(encode_function_call([0; 4], &[AbiParam::Address(self.model)]))
            }
            FactoryCall::Get { index } => encode_account_info(
                &self.clone_address(index),
                state.deployed.contains(&index),
                index.salt(),
            ),
            // The factory has no getters besides the two above.
            _ => Vec::new(),
        }
    }
}

fn strip_selector(mut calldata: Vec<u8>) -> Vec<u8> {
    calldata.drain(..4);
    calldata
}

fn word(value: U256) -> Vec<u8> {
    value.to_be_bytes::<32>().to_vec()
}

#[async_trait]
impl NetworkChannel for MockChannel {
    async fn chain_id(&self) -> Result<u64, ChannelError> {
        Ok(CHAIN_ID)
    }

    async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ChannelError> {
        let target = parse_address(to).map_err(|e| ChannelError::Rpc {
            code: -32602,
            message: e.to_string(),
        })?;

        let mut state = self.state();
        state.reads.push(format_address(&target));

        if let Some(error) = state.call_failure.clone() {
            return Err(error);
        }
        if state.reverting.contains(&target) {
            return Err(ChannelError::Rpc {
                code: 3,
                message: "execution reverted".into(),
            });
        }

        if target == self.factory {
            let call = FactoryCall::decode(data).map_err(|_| ChannelError::Rpc {
                code: 3,
                message: "execution reverted".into(),
            })?;
            return Ok(self.factory_read(&state, call));
        }

        if let Some(token) = state.tokens.get(&target) {
            let selector = &data[..4];
            if selector == function_selector("decimals()") {
                return Ok(word(U256::from(token.decimals)));
            }
            if selector == function_selector("balanceOf(address)") {
                let mut holder = [0u8; 20];
                holder.copy_from_slice(&data[16..36]);
                let units = token.balances.get(&holder).copied().unwrap_or_default();
                return Ok(word(units));
            }
        }

        // Calls to accounts without code succeed with no data.
        Ok(Vec::new())
    }

    async fn balance(&self, address: &str) -> Result<U256, ChannelError> {
        let holder = parse_address(address).map_err(|e| ChannelError::InvalidResponse(e.to_string()))?;
        let state = self.state();
        if let Some(error) = state.call_failure.clone() {
            return Err(error);
        }
        Ok(state.native.get(&holder).copied().unwrap_or_default())
    }

    async fn transaction_count(&self, _address: &str) -> Result<u64, ChannelError> {
        Ok(self.state().nonce)
    }

    async fn estimate_gas(&self, _request: &CallRequest) -> Result<u64, ChannelError> {
        Ok(GAS_ESTIMATE)
    }

    async fn fee_data(&self) -> Result<FeeData, ChannelError> {
        Ok(FeeData {
            base_fee_per_gas: Some(BASE_FEE),
            max_priority_fee_per_gas: Some(NODE_PRIORITY_FEE),
            gas_price: BASE_FEE + NODE_PRIORITY_FEE,
        })
    }

    async fn fill_transaction(
        &self,
        request: &CallRequest,
        options: &TxOptions,
    ) -> Result<EthTransaction, ChannelError> {
        self.state().options.push(options.clone());
        fill_transaction(self, request, options).await
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, ChannelError> {
        let mut state = self.state();
        if let Some(error) = state.send_failure.take() {
            return Err(error);
        }

        let decoded = decode_signed_transaction(raw_tx).map_err(|e| ChannelError::Rpc {
            code: -32602,
            message: e.to_string(),
        })?;
        if decoded.tx.chain_id != CHAIN_ID {
            return Err(ChannelError::Rpc {
                code: -32000,
                message: "invalid chain id".into(),
            });
        }
        if decoded.tx.nonce < state.nonce {
            return Err(ChannelError::Rpc {
                code: -32000,
                message: "nonce too low".into(),
            });
        }

        let call = FactoryCall::decode(&decoded.tx.data).map_err(|e| ChannelError::Rpc {
            code: -32000,
            message: e.to_string(),
        })?;
        if let FactoryCall::Create { index } = &call {
            state.deployed.insert(*index);
        }

        state.nonce = decoded.tx.nonce + 1;
        let block_number = state.sent.len() as u64 + 1;
        let success = !std::mem::take(&mut state.reverted_next);
        state.receipts.insert(
            decoded.tx_hash.clone(),
            TransactionReceipt {
                transaction_hash: decoded.tx_hash.clone(),
                block_number,
                gas_used: GAS_ESTIMATE / 2,
                success,
            },
        );
        state.sent.push(SentTransaction {
            tx: decoded.tx,
            call,
            hash: decoded.tx_hash.clone(),
        });

        Ok(decoded.tx_hash)
    }

    async fn transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, ChannelError> {
        Ok(self.state().receipts.get(hash).cloned())
    }
}

pub fn client_with(channel: Arc<MockChannel>) -> WalletClient {
    WalletClient::new(
        FACTORY,
        WalletOptions::new()
            .signer(Signer::from_hex(OWNER_KEY).unwrap())
            .channel(channel)
            .model_account(MODEL),
    )
    .unwrap()
}

pub fn setup() -> (Arc<MockChannel>, WalletClient) {
    let channel = Arc::new(MockChannel::new());
    let client = client_with(channel.clone());
    (channel, client)
}
