//! Key handling and transaction signing.
//!
//! # Security
//! - Key bytes live in a [`SecretKey`] that zeroes them on drop
//! - The secp256k1 signer is materialised per signature and dropped right after
//! - Keys are never logged, formatted or serialized
//!
//! Signatures are RFC 6979 deterministic ECDSA: the same transaction and key
//! always produce the same raw bytes and hash.

use alloy::consensus::{SignableTransaction, Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::{Decodable2718, Encodable2718};
use alloy::primitives::{keccak256, Address, Bytes, Signature, TxHash, TxKind};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::blockchain::address::to_checksum;
use crate::blockchain::builder::UnsignedTransaction;
use crate::blockchain::types::{SigningError, TransferResult};

/// A 32-byte secp256k1 private key, zeroed on drop.
pub struct SecretKey {
    bytes: Zeroizing<[u8; 32]>,
}

impl SecretKey {
    /// Parse a hex key, with or without `0x` prefix.
    pub fn from_hex(private_key_hex: &str) -> Result<Self, SigningError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let mut bytes = Zeroizing::new([0u8; 32]);
        alloy::hex::decode_to_slice(key_hex, &mut bytes[..]).map_err(|_| {
            SigningError::InvalidKey("expected 32 bytes of hex".to_string())
        })?;

        let key = Self { bytes };
        // reject zero / out-of-range scalars up front
        key.signer()?;
        Ok(key)
    }

    /// Read a hex key from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self, SigningError> {
        let value = Zeroizing::new(
            std::env::var(var).map_err(|_| SigningError::MissingKey(var.to_string()))?,
        );
        Self::from_hex(value.trim())
    }

    fn signer(&self) -> Result<PrivateKeySigner, SigningError> {
        PrivateKeySigner::from_slice(&self.bytes[..])
            .map_err(|_| SigningError::InvalidKey("not a valid secp256k1 scalar".to_string()))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// A transaction with its signature and wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub unsigned: UnsignedTransaction,
    pub signature: Signature,
    /// EIP-2718 encoding (plain RLP for legacy transactions).
    pub raw: Bytes,
    /// keccak-256 of `raw`.
    pub hash: TxHash,
}

/// The result of decoding raw transaction bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    /// Fields as encoded; `sender` is the recovered signer.
    pub unsigned: UnsignedTransaction,
    pub signature: Signature,
    pub hash: TxHash,
}

impl SignedTransaction {
    /// Decode raw bytes and recover the signer.
    pub fn decode(raw: &[u8]) -> Result<DecodedTransaction, SigningError> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| SigningError::Decode(e.to_string()))?;

        let signed: Signed<TxLegacy> = match envelope {
            TxEnvelope::Legacy(signed) => signed,
            other => {
                return Err(SigningError::Decode(format!(
                    "unsupported transaction type {:?}",
                    other.tx_type()
                )))
            }
        };

        let tx = signed.tx();
        let recipient = match tx.to {
            TxKind::Call(to) => to,
            TxKind::Create => {
                return Err(SigningError::Decode("contract creation".to_string()));
            }
        };
        let chain_id = tx
            .chain_id
            .ok_or_else(|| SigningError::Decode("missing EIP-155 chain id".to_string()))?;

        let signature = *signed.signature();
        let sender = signature
            .recover_address_from_prehash(&signed.signature_hash())
            .map_err(|e| SigningError::Unrecoverable(e.to_string()))?;

        Ok(DecodedTransaction {
            unsigned: UnsignedTransaction {
                sender,
                recipient,
                nonce: tx.nonce,
                gas_price: alloy::primitives::U256::from(tx.gas_price),
                gas_limit: alloy::primitives::U256::from(tx.gas_limit),
                payload: tx.input.clone(),
                value: tx.value,
                chain_id,
            },
            signature,
            hash: *signed.hash(),
        })
    }
}

/// Signs transactions for a single account.
///
/// Cloning shares the key; signing needs only `&self`, so one signer can
/// serve concurrent transfers.
#[derive(Debug, Clone)]
pub struct TransactionSigner {
    key: Arc<SecretKey>,
    address: Address,
}

impl TransactionSigner {
    pub fn new(key: SecretKey) -> Result<Self, SigningError> {
        let address = key.signer()?.address();
        tracing::info!(address = %address, "Signer initialized");
        Ok(Self {
            key: Arc::new(key),
            address,
        })
    }

    /// The key's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign `tx`, producing its raw encoding and hash.
    pub fn sign(&self, tx: &UnsignedTransaction) -> TransferResult<SignedTransaction> {
        if tx.sender != self.address {
            return Err(SigningError::SenderMismatch {
                sender: to_checksum(&tx.sender),
                key_address: to_checksum(&self.address),
            }
            .into());
        }

        let legacy = tx.to_legacy()?;
        let digest = legacy.signature_hash();

        let signature = {
            let signer = self.key.signer()?;
            signer
                .sign_hash_sync(&digest)
                .map_err(|e| SigningError::Unrecoverable(e.to_string()))?
        };

        let recovered = signature
            .recover_address_from_prehash(&digest)
            .map_err(|e| SigningError::Unrecoverable(e.to_string()))?;
        if recovered != self.address {
            return Err(SigningError::Unrecoverable(format!(
                "recovered {} instead of signer",
                to_checksum(&recovered)
            ))
            .into());
        }

        let envelope = TxEnvelope::Legacy(legacy.into_signed(signature));
        let raw: Bytes = envelope.encoded_2718().into();
        let hash = keccak256(&raw);

        tracing::debug!(tx_hash = %hash, nonce = tx.nonce, "Transaction signed");

        Ok(SignedTransaction {
            unsigned: tx.clone(),
            signature,
            raw,
            hash,
        })
    }
}
