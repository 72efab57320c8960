//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Addresses pass checksum validation before anything touches the network
//! - Validate value ranges (timeouts > 0, attempts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: TransferConfig → Result<(), Vec<ValidationError>>

use crate::blockchain::address::parse_address;
use crate::config::schema::TransferConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &TransferConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rpc.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("rpc.rpc_url", "not a valid URL"));
    }
    for url in &config.rpc.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "rpc.failover_urls",
                format!("'{url}' is not a valid URL"),
            ));
        }
    }
    if config.rpc.chain_id == 0 {
        errors.push(ValidationError::new("rpc.chain_id", "must be non-zero"));
    }
    if config.rpc.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.rpc_timeout_secs", "must be non-zero"));
    }

    if let Err(e) = parse_address(&config.account.sender_address) {
        errors.push(ValidationError::new("account.sender_address", e.to_string()));
    }
    if config.account.private_key_env.is_empty() {
        errors.push(ValidationError::new("account.private_key_env", "must be set"));
    }

    if let Err(e) = parse_address(&config.token.contract_address) {
        errors.push(ValidationError::new("token.contract_address", e.to_string()));
    }

    if config.confirmation.max_attempts == 0 {
        errors.push(ValidationError::new("confirmation.max_attempts", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
