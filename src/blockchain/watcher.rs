//! Receipt polling.
//!
//! # State Transitions
//! ```text
//! Pending → Pending:   no receipt yet, or the query failed
//! Pending → Confirmed: receipt with success status
//! Pending → Failed:    receipt with failure status
//! Pending → TimedOut:  max_attempts queries without a receipt
//! Pending → Cancelled: cancel signal seen at a poll boundary
//! ```
//!
//! Query errors count as "not found" for that attempt. Only exhausting the
//! attempt budget is reported.

use alloy::primitives::TxHash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::blockchain::rpc::RpcTransport;
use crate::blockchain::types::{
    ConfirmationState, Receipt, ReceiptStatus, TransferError, TransferResult,
};
use crate::config::ConfirmationConfig;
use crate::lifecycle::CancelSignal;
use crate::observability::metrics;

/// How often and how long to poll for a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            interval: Duration::from_secs(15),
        }
    }
}

impl From<&ConfirmationConfig> for PollPolicy {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: Duration::from_secs(config.poll_interval_secs),
        }
    }
}

/// Polls the node until a transaction is mined or the budget runs out.
#[derive(Clone)]
pub struct ConfirmationWatcher {
    transport: Arc<dyn RpcTransport>,
}

impl ConfirmationWatcher {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Wait for `tx_hash` to be mined successfully.
    pub async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        policy: &PollPolicy,
        cancel: &CancelSignal,
    ) -> TransferResult<Receipt> {
        let mut attempt = 0;

        let (state, outcome) = loop {
            attempt += 1;
            metrics::record_receipt_poll();

            match self.transport.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => match receipt.status {
                    ReceiptStatus::Success => break (ConfirmationState::Confirmed, Ok(receipt)),
                    ReceiptStatus::Failure => {
                        break (
                            ConfirmationState::Failed,
                            Err(TransferError::TransactionReverted {
                                tx_hash,
                                block_number: receipt.block_number,
                            }),
                        )
                    }
                },
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, attempt, "Transaction pending");
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, attempt, error = %e, "Receipt query failed, will retry");
                }
            }

            if attempt >= policy.max_attempts {
                break (
                    ConfirmationState::TimedOut,
                    Err(TransferError::ConfirmationTimeout {
                        tx_hash,
                        attempts: attempt,
                    }),
                );
            }

            let cancelled = cancel.is_cancelled()
                || tokio::select! {
                    _ = sleep(policy.interval) => false,
                    _ = cancel.cancelled() => true,
                };
            if cancelled {
                break (
                    ConfirmationState::Cancelled,
                    Err(TransferError::CancellationRequested {
                        tx_hash: Some(tx_hash),
                    }),
                );
            }
        };

        debug_assert!(state.is_terminal());
        match &outcome {
            Ok(receipt) => tracing::info!(
                tx_hash = %tx_hash,
                block_number = ?receipt.block_number,
                attempts = attempt,
                "Transaction confirmed"
            ),
            Err(e) => tracing::warn!(tx_hash = %tx_hash, state = ?state, attempts = attempt, error = %e, "Confirmation ended without success"),
        }
        outcome
    }
}

impl std::fmt::Debug for ConfirmationWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationWatcher").finish_non_exhaustive()
    }
}
