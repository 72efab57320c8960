//! token-transfer CLI.
//!
//! ```text
//! token-transfer --config transfer.toml --to 0x… --amount 1000000
//! ```
//!
//! The signing key is read from the environment variable named by
//! `account.private_key_env` in the config file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alloy::primitives::U256;
use clap::Parser;

use token_transfer::blockchain::{Broadcast, SecretKey, TransactionManager};
use token_transfer::config::load_config;
use token_transfer::lifecycle::{signals, CancelHandle};
use token_transfer::observability::logging;

#[derive(Parser)]
#[command(name = "token-transfer")]
#[command(about = "Send an ERC-20 transfer and wait for confirmation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Recipient address (checksummed, or single-case hex).
    #[arg(long)]
    to: String,

    /// Amount in the token's base units.
    #[arg(long, value_parser = parse_amount)]
    amount: U256,

    /// Override `confirmation.max_attempts` (at least 1).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,

    /// Override `confirmation.poll_interval_secs`.
    #[arg(long)]
    poll_interval_secs: Option<u64>,
}

fn parse_amount(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s, 10).map_err(|e| format!("invalid amount '{}': {}", s, e))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(attempts) = cli.max_attempts {
        config.confirmation.max_attempts = attempts;
    }
    if let Some(secs) = cli.poll_interval_secs {
        config.confirmation.poll_interval_secs = secs;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        rpc_url = %config.rpc.rpc_url,
        chain_id = config.rpc.chain_id,
        contract = %config.token.contract_address,
        max_attempts = config.confirmation.max_attempts,
        poll_interval_secs = config.confirmation.poll_interval_secs,
        "Configuration loaded"
    );

    let key = SecretKey::from_env(&config.account.private_key_env)?;
    let manager = TransactionManager::connect(&config, key).await?;

    let cancel = Arc::new(CancelHandle::new());
    signals::cancel_on_ctrl_c(cancel.clone());

    match manager
        .transfer_with_cancel(&cli.to, cli.amount, &cancel.signal())
        .await
    {
        Ok(tx_hash) => {
            let summary = serde_json::json!({
                "status": "confirmed",
                "tx_hash": tx_hash.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Transfer failed: {}", e);
            match e.was_broadcast() {
                Broadcast::Never => eprintln!("Nothing was broadcast; safe to retry."),
                Broadcast::Maybe | Broadcast::Yes => {
                    if let Some(hash) = e.tx_hash() {
                        eprintln!(
                            "Transaction {} may be on chain; check it before retrying.",
                            hash
                        );
                    }
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
