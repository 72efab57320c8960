//! Transfer orchestration.
//!
//! # Pipeline
//! ```text
//! validate recipient
//!     → nonce, gas price        (ChainStateReader)
//!     → draft                   (TxBuilder)
//!     → gas estimate            (ChainStateReader, against the drafted call)
//!     → finalize                (TxBuilder)
//!     → sign                    (TransactionSigner)
//!     → broadcast               (Broadcaster)
//!     → await receipt           (ConfirmationWatcher)
//! ```
//!
//! Every step runs in sequence and the first failure ends the transfer with
//! that step's error, unchanged.
//!
//! # Nonce Risk
//! The nonce is read fresh for every transfer and never reserved locally.
//! Two concurrent transfers from the same account will read the same nonce
//! and one of them will be rejected or replace the other. Callers must
//! serialise transfers per account.

use alloy::primitives::{Address, TxHash, U256};
use std::sync::Arc;
use tracing::Instrument;

use crate::blockchain::address::{parse_address, to_checksum};
use crate::blockchain::broadcaster::Broadcaster;
use crate::blockchain::builder::TxBuilder;
use crate::blockchain::chain_state::ChainStateReader;
use crate::blockchain::rpc::RpcTransport;
use crate::blockchain::client::BlockchainClient;
use crate::blockchain::signer::{SecretKey, TransactionSigner};
use crate::blockchain::types::{SigningError, TransferError, TransferResult};
use crate::blockchain::watcher::{ConfirmationWatcher, PollPolicy};
use crate::config::TransferConfig;
use crate::lifecycle::CancelSignal;
use crate::observability::metrics;

/// Static parameters of a [`TransactionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub sender: Address,
    pub contract: Address,
    pub chain_id: u64,
    pub poll_policy: PollPolicy,
}

impl TransferSettings {
    /// Settings from a validated configuration.
    pub fn from_config(config: &TransferConfig) -> TransferResult<Self> {
        Ok(Self {
            sender: parse_address(&config.account.sender_address)?,
            contract: parse_address(&config.token.contract_address)?,
            chain_id: config.rpc.chain_id,
            poll_policy: PollPolicy::from(&config.confirmation),
        })
    }
}

/// Sends ERC-20 transfers from one account.
///
/// Holds no per-transfer state; `transfer` may be called concurrently
/// (see the module docs for the nonce caveat).
#[derive(Debug, Clone)]
pub struct TransactionManager {
    settings: TransferSettings,
    reader: ChainStateReader,
    builder: TxBuilder,
    signer: TransactionSigner,
    broadcaster: Broadcaster,
    watcher: ConfirmationWatcher,
}

impl TransactionManager {
    /// Wire the pipeline over `transport`.
    ///
    /// Fails if the configured sender is not the signing key's address.
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        signer: TransactionSigner,
        settings: TransferSettings,
    ) -> TransferResult<Self> {
        if signer.address() != settings.sender {
            return Err(SigningError::SenderMismatch {
                sender: to_checksum(&settings.sender),
                key_address: to_checksum(&signer.address()),
            }
            .into());
        }

        Ok(Self {
            reader: ChainStateReader::new(transport.clone()),
            builder: TxBuilder::new(settings.chain_id),
            broadcaster: Broadcaster::new(transport.clone()),
            watcher: ConfirmationWatcher::new(transport),
            signer,
            settings,
        })
    }

    /// Connect to the configured node and wire the pipeline over it.
    pub async fn connect(config: &TransferConfig, key: SecretKey) -> TransferResult<Self> {
        let settings = TransferSettings::from_config(config)?;
        let signer = TransactionSigner::new(key)?;
        let client = BlockchainClient::new(config.rpc.clone())
            .await
            .map_err(|e| TransferError::ChainQuery {
                operation: "connect",
                reason: e.to_string(),
            })?;
        Self::new(Arc::new(client), signer, settings)
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Transfer `amount` base units of the token to `to` and wait for
    /// confirmation. Returns the transaction hash.
    pub async fn transfer(&self, to: &str, amount: U256) -> TransferResult<TxHash> {
        self.transfer_with_cancel(to, amount, &CancelSignal::never()).await
    }

    /// [`transfer`](Self::transfer) with cooperative cancellation.
    ///
    /// Cancellation is honoured before broadcast and between receipt polls.
    pub async fn transfer_with_cancel(
        &self,
        to: &str,
        amount: U256,
        cancel: &CancelSignal,
    ) -> TransferResult<TxHash> {
        let span = tracing::info_span!("transfer", to = %to, amount = %amount);
        let result = self.run(to, amount, cancel).instrument(span).await;
        metrics::record_outcome(&result);
        result
    }

    async fn run(&self, to: &str, amount: U256, cancel: &CancelSignal) -> TransferResult<TxHash> {
        // validate before any RPC round-trip
        let counterparty = parse_address(to)?;
        let sender = self.settings.sender;
        let contract = self.settings.contract;

        ensure_not_cancelled(cancel)?;

        let nonce = self.reader.get_nonce(sender).await?;
        let gas_price = self.reader.get_gas_price().await?;

        let draft = self
            .builder
            .draft(sender, contract, counterparty, amount, nonce, gas_price);
        let call = draft.call_request();
        let gas_limit = self
            .reader
            .estimate_gas(call.from, call.to, call.input, call.value)
            .await?;

        let unsigned = self.builder.finalize(draft, gas_limit)?;
        let signed = self.signer.sign(&unsigned)?;

        // last point at which nothing has been sent
        ensure_not_cancelled(cancel)?;

        let tx_hash = self.broadcaster.submit(&signed).await?;

        self.watcher
            .await_confirmation(tx_hash, &self.settings.poll_policy, cancel)
            .await?;

        Ok(tx_hash)
    }
}

fn ensure_not_cancelled(cancel: &CancelSignal) -> TransferResult<()> {
    if cancel.is_cancelled() {
        tracing::info!("Transfer cancelled before broadcast");
        return Err(TransferError::CancellationRequested { tx_hash: None });
    }
    Ok(())
}
