//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! The signing key is never part of the file; only the name of the
//! environment variable that holds it.

use serde::{Deserialize, Serialize};

/// Root configuration for the transfer tool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransferConfig {
    /// Node endpoint settings.
    pub rpc: RpcConfig,

    /// Sending account.
    pub account: AccountConfig,

    /// Token contract.
    pub token: TokenConfig,

    /// Receipt polling.
    pub confirmation: ConfirmationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
        }
    }
}

/// Sending account configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Checksummed sender address; must match the signing key.
    pub sender_address: String,

    /// Environment variable holding the hex private key.
    pub private_key_env: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            sender_address: String::new(),
            private_key_env: "TRANSFER_PRIVATE_KEY".to_string(),
        }
    }
}

/// Token contract configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Checksummed ERC-20 contract address.
    pub contract_address: String,
}

/// Receipt polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Receipt queries before giving up.
    pub max_attempts: u32,

    /// Delay between receipt queries in seconds.
    pub poll_interval_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            poll_interval_secs: 15,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
