use alloy_primitives::U256;

use crate::abi::{encode_function_call, AbiParam};
use crate::address::parse_address;
use crate::error::EthError;

/// Function selector for `transfer(address,uint256)`: `0xa9059cbb`.
const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Function selector for `approve(address,uint256)`: `0x095ea7b3`.
const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// Encodes an ERC-20 `transfer(address,uint256)` call.
pub fn encode_transfer(to: &str, amount: U256) -> Result<Vec<u8>, EthError> {
    let addr = parse_address(to)?;
    let params = [AbiParam::Address(addr.into()), AbiParam::Uint(amount)];
    Ok(encode_function_call(TRANSFER_SELECTOR, &params))
}

/// Encodes an ERC-20 `approve(address,uint256)` call.
pub fn encode_approve(spender: &str, amount: U256) -> Result<Vec<u8>, EthError> {
    let addr = parse_address(spender)?;
    let params = [AbiParam::Address(addr.into()), AbiParam::Uint(amount)];
    Ok(encode_function_call(APPROVE_SELECTOR, &params))
}
