//! Metrics collection.
//!
//! # Metrics
//! - `transfer_rpc_failures_total` (counter): failed RPC calls by operation
//! - `transfer_receipt_polls_total` (counter): receipt queries issued
//! - `transfer_outcomes_total` (counter): finished transfers by outcome
//!
//! Recording goes through the `metrics` facade; the embedding process
//! chooses the exporter.

use crate::blockchain::types::TransferError;

/// Count a failed RPC call.
pub fn record_rpc_failure(operation: &'static str) {
    metrics::counter!("transfer_rpc_failures_total", "operation" => operation).increment(1);
}

/// Count one receipt query.
pub fn record_receipt_poll() {
    metrics::counter!("transfer_receipt_polls_total").increment(1);
}

/// Count a finished transfer.
pub fn record_outcome(result: &Result<alloy::primitives::TxHash, TransferError>) {
    metrics::counter!("transfer_outcomes_total", "outcome" => outcome_label(result)).increment(1);
}

/// Stable label for an outcome.
pub fn outcome_label(result: &Result<alloy::primitives::TxHash, TransferError>) -> &'static str {
    match result {
        Ok(_) => "confirmed",
        Err(TransferError::InvalidAddress { .. }) => "invalid_address",
        Err(TransferError::ChainQuery { .. }) => "chain_query_failed",
        Err(TransferError::Build(_)) => "build_failed",
        Err(TransferError::Signing(_)) => "signing_failed",
        Err(TransferError::BroadcastRejected { .. }) => "broadcast_rejected",
        Err(TransferError::BroadcastIndeterminate { .. }) => "broadcast_indeterminate",
        Err(TransferError::TransactionReverted { .. }) => "reverted",
        Err(TransferError::ConfirmationTimeout { .. }) => "timed_out",
        Err(TransferError::CancellationRequested { .. }) => "cancelled",
    }
}
