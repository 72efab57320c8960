//! ERC-20 token transfers over JSON-RPC.
//!
//! Reads chain state, builds and signs a legacy EIP-155 transaction
//! locally, broadcasts it and polls for the receipt.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use blockchain::{TransactionManager, TransferError};
pub use config::TransferConfig;
pub use lifecycle::{CancelHandle, CancelSignal};
