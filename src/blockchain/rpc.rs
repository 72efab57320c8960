//! JSON-RPC transport seam.
//!
//! The transfer pipeline talks to the node only through [`RpcTransport`].
//! [`BlockchainClient`](crate::blockchain::client::BlockchainClient) is the
//! production implementation; tests substitute mocks.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::types::{Receipt, RpcError};

/// A prospective call, as submitted for gas estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
}

impl From<CallRequest> for TransactionRequest {
    fn from(call: CallRequest) -> Self {
        TransactionRequest::default()
            .with_from(call.from)
            .with_to(call.to)
            .with_input(call.input)
            .with_value(call.value)
    }
}

/// Node operations the transfer pipeline depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    /// `eth_getTransactionCount` for the pending block.
    async fn get_transaction_count(&self, address: Address) -> Result<u64, RpcError>;

    /// `eth_gasPrice`.
    async fn get_gas_price(&self) -> Result<U256, RpcError>;

    /// `eth_estimateGas`.
    async fn estimate_gas(&self, call: CallRequest) -> Result<U256, RpcError>;

    /// `eth_sendRawTransaction`.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, RpcError>;

    /// `eth_getTransactionReceipt`; `None` until the transaction is mined.
    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError>;
}

/// JSON-RPC method names, used as the `operation` in errors, logs and metrics.
pub mod method {
    pub const GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
    pub const GAS_PRICE: &str = "eth_gasPrice";
    pub const ESTIMATE_GAS: &str = "eth_estimateGas";
    pub const SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
}
