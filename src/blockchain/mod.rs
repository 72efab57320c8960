//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! TransactionManager::transfer(to, amount)
//!     → address.rs      (checksum validation, before any RPC)
//!     → chain_state.rs  (nonce, gas price, gas estimate)
//!     → builder.rs      (envelope + EIP-155 preimage, calldata from erc20.rs)
//!     → signer.rs       (RFC 6979 ECDSA, raw bytes, hash)
//!     → broadcaster.rs  (eth_sendRawTransaction)
//!     → watcher.rs      (receipt polling)
//! ```
//! All node access goes through `rpc::RpcTransport`; `client.rs` is the
//! alloy-backed implementation.
//!
//! # Security Constraints
//! - Private keys are held in zeroizing buffers and never logged
//! - All RPC calls have configurable timeouts
//! - Addresses are validated before they reach any other component

pub mod address;
pub mod broadcaster;
pub mod builder;
pub mod chain_state;
pub mod client;
pub mod erc20;
pub mod manager;
pub mod rpc;
pub mod signer;
pub mod types;
pub mod watcher;

pub use client::BlockchainClient;
pub use manager::{TransactionManager, TransferSettings};
pub use rpc::{CallRequest, RpcTransport};
pub use signer::{SecretKey, SignedTransaction, TransactionSigner};
pub use types::{Broadcast, Receipt, ReceiptStatus, RpcError, TransferError, TransferResult};
pub use watcher::PollPolicy;
