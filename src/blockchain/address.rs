//! Address parsing with EIP-55 checksum enforcement.
//!
//! A hex body that is entirely lowercase or entirely uppercase carries no
//! checksum and is accepted as-is. Any mixed-case body must match the
//! EIP-55 rendering exactly.

use alloy::primitives::Address;

use crate::blockchain::types::{TransferError, TransferResult};

/// Parse and validate an address string.
pub fn parse_address(input: &str) -> TransferResult<Address> {
    let invalid = || TransferError::InvalidAddress {
        input: input.to_string(),
    };

    let body = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    if body.len() != 40 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(format!("0x{body}"), None).map_err(|_| invalid())
    } else {
        body.parse::<Address>().map_err(|_| invalid())
    }
}

/// Render an address in its checksummed form.
pub fn to_checksum(address: &Address) -> String {
    address.to_checksum(None)
}
