//! ERC-20 call encoding.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// The subset of the ERC-20 interface this crate calls.
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Calldata for `transfer(to, amount)`.
pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// Decode `transfer` calldata back into its arguments.
pub fn decode_transfer(calldata: &[u8]) -> Option<(Address, U256)> {
    IERC20::transferCall::abi_decode(calldata)
        .ok()
        .map(|call| (call.to, call.amount))
}
