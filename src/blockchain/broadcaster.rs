//! Raw transaction submission.

use alloy::primitives::TxHash;
use std::sync::Arc;

use crate::blockchain::rpc::RpcTransport;
use crate::blockchain::signer::SignedTransaction;
use crate::blockchain::types::{RpcError, TransferError, TransferResult};

/// Submits signed transactions to the node.
///
/// Resubmitting identical raw bytes is harmless and yields the same hash: a
/// node that already holds the transaction answers "already known", which
/// is reported as success.
#[derive(Clone)]
pub struct Broadcaster {
    transport: Arc<dyn RpcTransport>,
}

impl Broadcaster {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Send `tx.raw` and return the transaction hash.
    pub async fn submit(&self, tx: &SignedTransaction) -> TransferResult<TxHash> {
        match self.transport.send_raw_transaction(tx.raw.clone()).await {
            Ok(hash) => {
                if hash != tx.hash {
                    tracing::warn!(
                        local_hash = %tx.hash,
                        node_hash = %hash,
                        "Node reported a different transaction hash"
                    );
                }
                tracing::info!(tx_hash = %hash, nonce = tx.unsigned.nonce, "Transaction broadcast");
                Ok(hash)
            }
            Err(e) if e.is_already_known() => {
                tracing::info!(tx_hash = %tx.hash, "Transaction already known to node");
                Ok(tx.hash)
            }
            Err(RpcError::Rejected { message, .. }) => {
                tracing::warn!(tx_hash = %tx.hash, reason = %message, "Broadcast rejected");
                Err(TransferError::BroadcastRejected { reason: message })
            }
            Err(e) => {
                tracing::error!(tx_hash = %tx.hash, error = %e, "Broadcast outcome unknown");
                Err(TransferError::BroadcastIndeterminate {
                    tx_hash: tx.hash,
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster").finish_non_exhaustive()
    }
}
