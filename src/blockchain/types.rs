//! Chain-specific types and error definitions.

use alloy::primitives::{TxHash, B256};
use serde::Serialize;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors raised by the JSON-RPC transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// The node answered with a JSON-RPC error object.
    #[error("node rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// Connection, HTTP or serialization failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// No response within the configured deadline.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node answered, but the payload could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A node refused the request after an earlier node may already have
    /// accepted it.
    #[error("inconclusive: {0}")]
    Inconclusive(String),
}

impl RpcError {
    /// True when the node itself refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RpcError::Rejected { .. })
    }

    /// True when the node simulated or executed the call and it reverted.
    pub fn is_revert(&self) -> bool {
        match self {
            RpcError::Rejected { code, message } => {
                *code == 3 || message.to_ascii_lowercase().starts_with("execution reverted")
            }
            _ => false,
        }
    }

    /// True when the node refused a raw transaction because it already
    /// holds it.
    pub fn is_already_known(&self) -> bool {
        match self {
            RpcError::Rejected { message, .. } => {
                let message = message.to_ascii_lowercase();
                KNOWN_TRANSACTION_MESSAGES
                    .iter()
                    .any(|known| message.contains(known))
            }
            _ => false,
        }
    }
}

/// Duplicate-submission errors as phrased by geth, erigon, besu and nethermind.
const KNOWN_TRANSACTION_MESSAGES: &[&str] = &[
    "already known",
    "known transaction",
    "alreadyknown",
    "already imported",
];

/// Failures while assembling a transaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The node simulated the call and it reverted.
    #[error("gas estimation reverted: {reason}")]
    EstimationReverted { reason: String },

    /// The node returned a zero gas estimate.
    #[error("gas estimate was zero")]
    ZeroGasEstimate,

    /// A value does not fit the width the ledger encoding uses.
    #[error("{field} does not fit in {bits} bits")]
    FieldOverflow { field: &'static str, bits: u32 },

    /// Both a native value and a call payload were supplied.
    #[error("transaction carries both a value transfer and a call payload")]
    AmbiguousCallKind,
}

/// Failures while signing. Never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// The key material could not be parsed into a secp256k1 scalar.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The key environment variable is missing.
    #[error("environment variable {0} not set")]
    MissingKey(String),

    /// The transaction's sender is not the key's address.
    #[error("sender {sender} does not match signing key address {key_address}")]
    SenderMismatch { sender: String, key_address: String },

    /// ECDSA failed or the signature did not recover to the signer.
    #[error("signature is not recoverable: {0}")]
    Unrecoverable(String),

    /// Raw bytes could not be decoded back into a signed transaction.
    #[error("cannot decode raw transaction: {0}")]
    Decode(String),
}

/// Errors that can occur during a token transfer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// An address failed checksum or format validation.
    #[error("invalid address: {input}")]
    InvalidAddress { input: String },

    /// A chain-state read failed.
    #[error("chain query {operation} failed: {reason}")]
    ChainQuery {
        operation: &'static str,
        reason: String,
    },

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    /// The node refused the raw transaction.
    #[error("broadcast rejected: {reason}")]
    BroadcastRejected { reason: String },

    /// The submission failed at the transport level; the node may have the
    /// transaction anyway.
    #[error("broadcast of {tx_hash} failed, outcome unknown: {reason}")]
    BroadcastIndeterminate { tx_hash: TxHash, reason: String },

    /// The transaction was mined with a failure status.
    #[error("transaction {tx_hash} reverted")]
    TransactionReverted {
        tx_hash: TxHash,
        block_number: Option<u64>,
    },

    /// No receipt within the attempt budget.
    #[error("transaction {tx_hash} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { tx_hash: TxHash, attempts: u32 },

    /// The caller cancelled the operation.
    #[error("transfer cancelled")]
    CancellationRequested { tx_hash: Option<TxHash> },
}

/// Whether a failed transfer reached the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    /// Nothing was sent. Safe to retry with a fresh nonce.
    Never,
    /// The submission may have reached the node.
    Maybe,
    /// The node accepted the transaction.
    Yes,
}

impl TransferError {
    /// Classify the error by how far the transaction got.
    pub fn was_broadcast(&self) -> Broadcast {
        match self {
            TransferError::InvalidAddress { .. }
            | TransferError::ChainQuery { .. }
            | TransferError::Build(_)
            | TransferError::Signing(_)
            | TransferError::BroadcastRejected { .. } => Broadcast::Never,
            TransferError::BroadcastIndeterminate { .. } => Broadcast::Maybe,
            TransferError::TransactionReverted { .. } | TransferError::ConfirmationTimeout { .. } => {
                Broadcast::Yes
            }
            TransferError::CancellationRequested { tx_hash } => {
                if tx_hash.is_some() {
                    Broadcast::Yes
                } else {
                    Broadcast::Never
                }
            }
        }
    }

    /// Hash of the transaction, if one was submitted.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            TransferError::BroadcastIndeterminate { tx_hash, .. }
            | TransferError::TransactionReverted { tx_hash, .. }
            | TransferError::ConfirmationTimeout { tx_hash, .. } => Some(*tx_hash),
            TransferError::CancellationRequested { tx_hash } => *tx_hash,
            _ => None,
        }
    }
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Execution status reported by a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Failure,
}

/// A mined transaction's receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
    pub block_hash: Option<B256>,
    pub gas_used: u64,
}

/// Confirmation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    /// No receipt yet.
    Pending,
    Confirmed,
    Failed,
    TimedOut,
    /// Cancelled at a poll boundary.
    Cancelled,
}

impl ConfirmationState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ConfirmationState::Pending)
    }
}
