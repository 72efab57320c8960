//! Transaction assembly.
//!
//! # Responsibilities
//! - Wrap ERC-20 calldata in a transaction envelope addressed to the token contract
//! - Produce the EIP-155 signing preimage
//!
//! Assembly happens in two steps because the gas estimate has to be taken
//! against the final calldata: [`TxBuilder::draft`] yields a
//! [`TransferDraft`] whose call is estimated, then [`TxBuilder::finalize`]
//! fixes the gas limit. Both steps are pure.

use alloy::consensus::{SignableTransaction, TxLegacy};
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};

use crate::blockchain::erc20;
use crate::blockchain::rpc::CallRequest;
use crate::blockchain::types::BuildError;

/// A fully specified transaction, ready for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub sender: Address,
    /// The token contract for ERC-20 transfers, the counterparty otherwise.
    pub recipient: Address,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub payload: Bytes,
    pub value: U256,
    pub chain_id: u64,
}

impl UnsignedTransaction {
    /// Check the call-kind invariant and the encoding widths.
    pub fn validate(&self) -> Result<(), BuildError> {
        if !self.payload.is_empty() && !self.value.is_zero() {
            return Err(BuildError::AmbiguousCallKind);
        }
        self.to_legacy().map(|_| ())
    }

    /// The ledger-native (legacy, EIP-155) representation.
    pub fn to_legacy(&self) -> Result<TxLegacy, BuildError> {
        let gas_price = u128::try_from(self.gas_price).map_err(|_| BuildError::FieldOverflow {
            field: "gas_price",
            bits: 128,
        })?;
        let gas_limit = u64::try_from(self.gas_limit).map_err(|_| BuildError::FieldOverflow {
            field: "gas_limit",
            bits: 64,
        })?;

        Ok(TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(self.recipient),
            value: self.value,
            input: self.payload.clone(),
        })
    }

    /// RLP signing preimage: `rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0])`.
    pub fn encode(&self) -> Result<Bytes, BuildError> {
        let mut out = Vec::new();
        self.to_legacy()?.encode_for_signing(&mut out);
        Ok(out.into())
    }

    /// keccak-256 of [`encode`](Self::encode); the digest that gets signed.
    pub fn signature_hash(&self) -> Result<B256, BuildError> {
        Ok(self.to_legacy()?.signature_hash())
    }
}

/// A transfer whose gas limit is not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub sender: Address,
    pub contract: Address,
    pub payload: Bytes,
    pub nonce: u64,
    pub gas_price: U256,
    pub chain_id: u64,
}

impl TransferDraft {
    /// The call to submit for gas estimation.
    pub fn call_request(&self) -> CallRequest {
        CallRequest {
            from: self.sender,
            to: self.contract,
            input: self.payload.clone(),
            value: U256::ZERO,
        }
    }
}

/// Assembles token-transfer transactions for one chain.
#[derive(Debug, Clone, Copy)]
pub struct TxBuilder {
    chain_id: u64,
}

impl TxBuilder {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Encode the `transfer(counterparty, amount)` call against `contract`.
    pub fn draft(
        &self,
        sender: Address,
        contract: Address,
        counterparty: Address,
        amount: U256,
        nonce: u64,
        gas_price: U256,
    ) -> TransferDraft {
        TransferDraft {
            sender,
            contract,
            payload: erc20::encode_transfer(counterparty, amount),
            nonce,
            gas_price,
            chain_id: self.chain_id,
        }
    }

    /// Fix the gas limit and validate the result.
    pub fn finalize(
        &self,
        draft: TransferDraft,
        gas_limit: U256,
    ) -> Result<UnsignedTransaction, BuildError> {
        let tx = UnsignedTransaction {
            sender: draft.sender,
            recipient: draft.contract,
            nonce: draft.nonce,
            gas_price: draft.gas_price,
            gas_limit,
            payload: draft.payload,
            value: U256::ZERO,
            chain_id: draft.chain_id,
        };
        tx.validate()?;

        tracing::debug!(
            nonce = tx.nonce,
            gas_price = %tx.gas_price,
            gas_limit = %tx.gas_limit,
            "Transaction assembled"
        );
        Ok(tx)
    }

    /// [`draft`](Self::draft) followed by [`finalize`](Self::finalize).
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        sender: Address,
        contract: Address,
        counterparty: Address,
        amount: U256,
        nonce: u64,
        gas_price: U256,
        gas_limit: U256,
    ) -> Result<UnsignedTransaction, BuildError> {
        let draft = self.draft(sender, contract, counterparty, amount, nonce, gas_price);
        self.finalize(draft, gas_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, hex};

    const SENDER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const TOKEN: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
    const TO: Address = address!("27F44B7dE8aBC05db1b3de48017DA84Ebc635be9");

    fn sample() -> UnsignedTransaction {
        TxBuilder::new(1)
            .build(
                SENDER,
                TOKEN,
                TO,
                U256::from(1_000_000_000u64),
                5,
                U256::from(20),
                U256::from(60_000),
            )
            .unwrap()
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = sample();
        let b = sample();
        assert_eq!(a, b);
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
        assert_eq!(a.signature_hash().unwrap(), b.signature_hash().unwrap());
    }

    #[test]
    fn test_transfer_envelope() {
        let tx = sample();
        assert_eq!(tx.recipient, TOKEN);
        assert!(tx.value.is_zero());
        assert_eq!(erc20::decode_transfer(&tx.payload), Some((TO, U256::from(1_000_000_000u64))));
    }

    #[test]
    fn test_draft_call_request_matches_final_payload() {
        let builder = TxBuilder::new(1);
        let draft = builder.draft(SENDER, TOKEN, TO, U256::from(7), 0, U256::from(1));
        let call = draft.call_request();
        let tx = builder.finalize(draft, U256::from(50_000)).unwrap();
        assert_eq!(call.input, tx.payload);
        assert_eq!(call.to, tx.recipient);
        assert_eq!(call.from, tx.sender);
    }

    #[test]
    fn test_eip155_preimage() {
        // The EIP-155 reference transaction.
        let tx = UnsignedTransaction {
            sender: Address::ZERO,
            recipient: address!("3535353535353535353535353535353535353535"),
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: U256::from(21_000),
            payload: Bytes::new(),
            value: U256::from(1_000_000_000_000_000_000u128),
            chain_id: 1,
        };
        assert_eq!(
            tx.encode().unwrap(),
            Bytes::from(hex!("ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"))
        );
        assert_eq!(
            tx.signature_hash().unwrap(),
            B256::from(hex!("daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"))
        );
    }

    #[test]
    fn test_gas_overflow_rejected() {
        let err = TxBuilder::new(1)
            .build(SENDER, TOKEN, TO, U256::from(1), 0, U256::from(1), U256::MAX)
            .unwrap_err();
        assert_eq!(err, BuildError::FieldOverflow { field: "gas_limit", bits: 64 });
    }

    #[test]
    fn test_value_and_payload_rejected() {
        let mut tx = sample();
        tx.value = U256::from(1);
        assert_eq!(tx.validate(), Err(BuildError::AmbiguousCallKind));
    }
}
