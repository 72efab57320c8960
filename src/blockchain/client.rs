//! Blockchain RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint (plus failovers)
//! - Serve the [`RpcTransport`] operations the transfer pipeline needs
//! - Keep node rejections distinct from network failures
//! - Enforce a deadline on every call

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError as AlloyRpcError, TransportErrorKind};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::rpc::{method, CallRequest, RpcTransport};
use crate::blockchain::types::{ChainId, Receipt, ReceiptStatus, RpcError};
use crate::config::schema::RpcConfig;
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Configuration.
    config: RpcConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Fails only if the primary URL cannot be parsed; an unreachable node
    /// is reported later, per call.
    pub async fn new(config: RpcConfig) -> Result<Self, RpcError> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            RpcError::Transport(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> Result<(), RpcError> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(RpcError::Malformed(format!(
                "chain ID mismatch: expected {}, got {}",
                self.config.chain_id, chain_id.0
            )));
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> Result<ChainId, RpcError> {
        self.with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Get the configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Run `call` against each provider in turn.
    ///
    /// Transport failures and timeouts move on to the next provider. A node
    /// rejection is returned at once.
    async fn with_failover<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, RpcError>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, AlloyRpcError<TransportErrorKind>>>,
    {
        let mut last_error = RpcError::Transport("no RPC providers configured".to_string());

        for (i, provider) in self.providers.iter().enumerate() {
            match self.attempt(i, operation, call(provider.clone())).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_rejection() => return Err(e),
                Err(e) => last_error = e,
            }
        }

        Err(last_error)
    }

    /// One provider call under the deadline. Non-rejection failures are
    /// logged and counted here.
    async fn attempt<T, Fut>(
        &self,
        provider_idx: usize,
        operation: &'static str,
        call: Fut,
    ) -> Result<T, RpcError>
    where
        Fut: Future<Output = Result<T, AlloyRpcError<TransportErrorKind>>>,
    {
        match timeout(self.timeout_duration, call).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                let err = map_rpc_error(e);
                if !err.is_rejection() {
                    tracing::warn!(provider_idx, operation, error = %err, "RPC error, trying next provider");
                    metrics::record_rpc_failure(operation);
                }
                Err(err)
            }
            Err(_) => {
                tracing::warn!(provider_idx, operation, "RPC timeout, trying next provider");
                metrics::record_rpc_failure(operation);
                Err(RpcError::Timeout(self.config.rpc_timeout_secs))
            }
        }
    }
}

#[async_trait::async_trait]
impl RpcTransport for BlockchainClient {
    async fn get_transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        self.with_failover(method::GET_TRANSACTION_COUNT, |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn get_gas_price(&self) -> Result<U256, RpcError> {
        self.with_failover(method::GAS_PRICE, |p| async move { p.get_gas_price().await })
            .await
            .map(U256::from)
    }

    async fn estimate_gas(&self, call: CallRequest) -> Result<U256, RpcError> {
        let request: TransactionRequest = call.into();
        self.with_failover(method::ESTIMATE_GAS, |p| {
            let request = request.clone();
            async move { p.estimate_gas(request).await }
        })
        .await
        .map(U256::from)
    }

    /// Fails over like every other call, except that once a provider has
    /// failed without answering, it may still have relayed the transaction.
    /// A later rejection is then [`RpcError::Inconclusive`] rather than
    /// [`RpcError::Rejected`], unless the node says it already holds it.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, RpcError> {
        let operation = method::SEND_RAW_TRANSACTION;
        let mut last_error = RpcError::Transport("no RPC providers configured".to_string());
        let mut maybe_delivered = false;

        for (i, provider) in self.providers.iter().enumerate() {
            let call = async {
                provider
                    .send_raw_transaction(&raw)
                    .await
                    .map(|pending| *pending.tx_hash())
            };
            match self.attempt(i, operation, call).await {
                Ok(hash) => return Ok(hash),
                Err(e) if e.is_rejection() && maybe_delivered && !e.is_already_known() => {
                    tracing::warn!(provider_idx = i, error = %e, "Rejected after an earlier provider failed");
                    return Err(RpcError::Inconclusive(format!("{last_error}; then {e}")));
                }
                Err(e) if e.is_rejection() => return Err(e),
                Err(e) => {
                    maybe_delivered = true;
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError> {
        self.with_failover(method::GET_TRANSACTION_RECEIPT, |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
        .map(|receipt| receipt.map(into_receipt))
    }
}

fn map_rpc_error(error: AlloyRpcError<TransportErrorKind>) -> RpcError {
    match error {
        AlloyRpcError::ErrorResp(payload) => RpcError::Rejected {
            code: payload.code,
            message: payload.message.to_string(),
        },
        e @ (AlloyRpcError::NullResp | AlloyRpcError::DeserError { .. }) => {
            RpcError::Malformed(e.to_string())
        }
        e => RpcError::Transport(e.to_string()),
    }
}

fn into_receipt(receipt: TransactionReceipt) -> Receipt {
    Receipt {
        tx_hash: receipt.transaction_hash,
        status: if receipt.status() {
            ReceiptStatus::Success
        } else {
            ReceiptStatus::Failure
        },
        block_number: receipt.block_number,
        block_hash: receipt.block_hash,
        gas_used: receipt.gas_used,
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;

    fn test_config() -> RpcConfig {
        RpcConfig {
            // nothing listens on port 1
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        // Client creation should succeed even if RPC is unreachable
        let result = BlockchainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = BlockchainClient::new(config).await.unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[tokio::test]
    async fn test_rpc_failover() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());

        let client = BlockchainClient::new(config).await.unwrap();
        assert_eq!(client.providers.len(), 2);

        // Both endpoints are closed; the error is a transport failure, not a rejection
        let err = client.get_gas_price().await.unwrap_err();
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_error_response_is_rejection() {
        let payload = ErrorPayload {
            code: -32000,
            message: "nonce too low".into(),
            data: None,
        };
        let err = map_rpc_error(AlloyRpcError::ErrorResp(payload));
        assert_eq!(
            err,
            RpcError::Rejected {
                code: -32000,
                message: "nonce too low".to_string()
            }
        );
    }

    #[test]
    fn test_null_response_is_malformed() {
        let err = map_rpc_error(AlloyRpcError::NullResp);
        assert!(matches!(err, RpcError::Malformed(_)));
    }
}
