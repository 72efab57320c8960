//! Fresh chain-state reads: nonce, gas price, gas estimate.
//!
//! Nothing is cached. A stale nonce is a nonce collision.

use alloy::primitives::{Address, Bytes, U256};
use std::sync::Arc;

use crate::blockchain::rpc::{method, CallRequest, RpcTransport};
use crate::blockchain::types::{BuildError, RpcError, TransferError, TransferResult};

/// Reads the account and network state a transfer is built from.
#[derive(Clone)]
pub struct ChainStateReader {
    transport: Arc<dyn RpcTransport>,
}

impl ChainStateReader {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Next transaction count for `address`, as the node sees it.
    pub async fn get_nonce(&self, address: Address) -> TransferResult<u64> {
        self.transport
            .get_transaction_count(address)
            .await
            .map_err(|e| query_error(method::GET_TRANSACTION_COUNT, e))
    }

    /// Network-suggested gas price in wei.
    pub async fn get_gas_price(&self) -> TransferResult<U256> {
        self.transport
            .get_gas_price()
            .await
            .map_err(|e| query_error(method::GAS_PRICE, e))
    }

    /// Simulate the call and return its gas cost.
    ///
    /// A revert is a build failure, not a query failure: retrying the same
    /// call cannot succeed. Other node errors (rate limits, unsupported
    /// method) are query failures.
    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        payload: Bytes,
        value: U256,
    ) -> TransferResult<U256> {
        let call = CallRequest {
            from,
            to,
            input: payload,
            value,
        };
        match self.transport.estimate_gas(call).await {
            Ok(gas) if gas.is_zero() => Err(BuildError::ZeroGasEstimate.into()),
            Ok(gas) => Ok(gas),
            Err(e) if e.is_revert() => {
                let reason = match e {
                    RpcError::Rejected { message, .. } => message,
                    other => other.to_string(),
                };
                Err(BuildError::EstimationReverted { reason }.into())
            }
            Err(e) => Err(query_error(method::ESTIMATE_GAS, e)),
        }
    }
}

impl std::fmt::Debug for ChainStateReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainStateReader").finish_non_exhaustive()
    }
}

fn query_error(operation: &'static str, error: RpcError) -> TransferError {
    tracing::warn!(operation, error = %error, "Chain query failed");
    TransferError::ChainQuery {
        operation,
        reason: error.to_string(),
    }
}
