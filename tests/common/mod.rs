//! Shared utilities for integration testing: an in-memory node and a
//! scripted JSON-RPC server.

#![allow(dead_code)]

pub mod rpc_node;

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use token_transfer::blockchain::erc20;
use token_transfer::blockchain::rpc::{method, CallRequest, RpcTransport};
use token_transfer::blockchain::{Receipt, ReceiptStatus, RpcError, SignedTransaction};

/// Anvil's first two dev accounts.
pub const KEY_0: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ADDRESS_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const ADDRESS_1: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

pub const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const RECIPIENT: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

#[derive(Default)]
struct NodeState {
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    /// Receipt polls seen per submitted transaction.
    polls: HashMap<TxHash, u32>,
    calls: Vec<&'static str>,
    sent: Vec<Bytes>,
}

/// A node that tracks nonces and token balances, validates raw
/// transactions and mines them after a fixed number of receipt polls.
pub struct FakeNode {
    state: Mutex<NodeState>,
    gas_price: U256,
    gas_estimate: U256,
    /// `None` never mines.
    polls_until_mined: Option<u32>,
    mined_status: ReceiptStatus,
}

impl FakeNode {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NodeState::default()),
            gas_price: U256::from(20),
            gas_estimate: U256::from(60_000),
            polls_until_mined: Some(1),
            mined_status: ReceiptStatus::Success,
        }
    }

    pub fn with_nonce(self, account: &str, nonce: u64) -> Self {
        self.state.lock().unwrap().nonces.insert(account.parse().unwrap(), nonce);
        self
    }

    pub fn with_balance(self, account: &str, balance: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(account.parse().unwrap(), U256::from(balance));
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = U256::from(gas_price);
        self
    }

    pub fn with_gas_estimate(mut self, gas: u64) -> Self {
        self.gas_estimate = U256::from(gas);
        self
    }

    pub fn mined_after(mut self, polls: u32) -> Self {
        self.polls_until_mined = Some(polls);
        self
    }

    pub fn never_mines(mut self) -> Self {
        self.polls_until_mined = None;
        self
    }

    pub fn reverts_on_chain(mut self) -> Self {
        self.mined_status = ReceiptStatus::Failure;
        self
    }

    /// RPC methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Raw transactions accepted so far.
    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn balance_of(&self, account: &str) -> U256 {
        let account: Address = account.parse().unwrap();
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    fn record(&self, call: &'static str) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn revert(message: &str) -> RpcError {
    RpcError::Rejected {
        code: 3,
        message: format!("execution reverted: {message}"),
    }
}

#[async_trait::async_trait]
impl RpcTransport for FakeNode {
    async fn get_transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        self.record(method::GET_TRANSACTION_COUNT);
        Ok(self.state.lock().unwrap().nonces.get(&address).copied().unwrap_or(0))
    }

    async fn get_gas_price(&self) -> Result<U256, RpcError> {
        self.record(method::GAS_PRICE);
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, call: CallRequest) -> Result<U256, RpcError> {
        self.record(method::ESTIMATE_GAS);
        let (_, amount) = erc20::decode_transfer(&call.input).ok_or_else(|| revert("bad calldata"))?;
        let balance = self
            .state
            .lock()
            .unwrap()
            .balances
            .get(&call.from)
            .copied()
            .unwrap_or_default();
        if balance < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        Ok(self.gas_estimate)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, RpcError> {
        self.record(method::SEND_RAW_TRANSACTION);
        let decoded = SignedTransaction::decode(&raw).map_err(|e| RpcError::Rejected {
            code: -32602,
            message: e.to_string(),
        })?;
        let tx = decoded.unsigned;

        let mut state = self.state.lock().unwrap();
        if state.sent.contains(&raw) {
            return Err(RpcError::Rejected {
                code: -32000,
                message: "already known".into(),
            });
        }
        let expected = state.nonces.get(&tx.sender).copied().unwrap_or(0);
        if tx.nonce < expected {
            return Err(RpcError::Rejected {
                code: -32000,
                message: "nonce too low".into(),
            });
        }
        state.nonces.insert(tx.sender, tx.nonce + 1);

        if let Some((to, amount)) = erc20::decode_transfer(&tx.payload) {
            let from_balance = state.balances.entry(tx.sender).or_default();
            *from_balance -= amount;
            *state.balances.entry(to).or_default() += amount;
        }

        state.polls.insert(decoded.hash, 0);
        state.sent.push(raw);
        Ok(decoded.hash)
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError> {
        self.record(method::GET_TRANSACTION_RECEIPT);
        let mut state = self.state.lock().unwrap();
        let Some(polls) = state.polls.get_mut(&tx_hash) else {
            return Ok(None);
        };
        *polls += 1;

        match self.polls_until_mined {
            Some(needed) if *polls >= needed => Ok(Some(Receipt {
                tx_hash,
                status: self.mined_status,
                block_number: Some(1),
                block_hash: None,
                gas_used: 51_000,
            })),
            _ => Ok(None),
        }
    }
}
