//! Minimal ABI encoding for EVM function calls.
//!
//! Covers the handful of static calls the pipeline builds by hand (ERC-20,
//! NFT transfers, the L1 fee oracle). StakeHub calls with struct returns go
//! through `alloy-sol-types` instead.

use alloy_primitives::U256;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// A single ABI parameter.
#[derive(Debug, Clone)]
pub enum AbiParam {
    /// A 20-byte address, left-padded to 32 bytes.
    Address([u8; 20]),
    Uint(U256),
    Bool(bool),
    /// Dynamic `bytes`: an offset in the head, length and padded data in
    /// the tail.
    Bytes(Vec<u8>),
}

impl AbiParam {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiParam::Bytes(_))
    }
}

/// First four bytes of `keccak256(signature)`, e.g.
/// `selector("transfer(address,uint256)") == [0xa9, 0x05, 0x9c, 0xbb]`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Encodes `selector || head(params) || tail(params)`.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let head_len = params.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for param in params {
        if param.is_dynamic() {
            head.extend_from_slice(&uint_word(U256::from(head_len + tail.len())));
            if let AbiParam::Bytes(bytes) = param {
                tail.extend_from_slice(&uint_word(U256::from(bytes.len())));
                tail.extend_from_slice(bytes);
                let padding = (32 - bytes.len() % 32) % 32;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
        } else {
            head.extend_from_slice(&static_word(param));
        }
    }

    let mut data = Vec::with_capacity(4 + head.len() + tail.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&head);
    data.extend_from_slice(&tail);
    data
}

fn static_word(param: &AbiParam) -> [u8; 32] {
    match param {
        AbiParam::Address(addr) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr);
            word
        }
        AbiParam::Uint(value) => uint_word(*value),
        AbiParam::Bool(flag) => uint_word(U256::from(u8::from(*flag))),
        AbiParam::Bytes(_) => [0u8; 32],
    }
}

fn uint_word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// Decodes the first word of a return value as a uint256.
pub fn decode_uint256(data: &[u8]) -> Result<U256, EthError> {
    if data.len() < 32 {
        return Err(EthError::EncodingError(format!(
            "expected at least 32 bytes for uint256, got {}",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[..32]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_known_values() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(selector("approve(address,uint256)"), [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(
            selector("safeTransferFrom(address,address,uint256)"),
            [0x42, 0x84, 0x2e, 0x0e]
        );
    }

    #[test]
    fn encode_address_param() {
        let mut addr = [0u8; 20];
        addr[0] = 0xde;
        addr[19] = 0xad;

        let word = static_word(&AbiParam::Address(addr));

        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &addr);
    }

    #[test]
    fn encode_bool_param() {
        assert_eq!(static_word(&AbiParam::Bool(true))[31], 1);
        assert_eq!(static_word(&AbiParam::Bool(false)), [0u8; 32]);
    }

    #[test]
    fn encode_function_call_with_selector_only() {
        let selector = [0xa9, 0x05, 0x9c, 0xbb];
        let data = encode_function_call(selector, &[]);
        assert_eq!(data, selector.to_vec());
    }

    #[test]
    fn encode_function_call_with_static_params() {
        let selector = [0xa9, 0x05, 0x9c, 0xbb];
        let mut addr = [0u8; 20];
        addr[19] = 0x01;

        let params = [AbiParam::Address(addr), AbiParam::Uint(U256::from(100))];
        let data = encode_function_call(selector, &params);

        assert_eq!(data.len(), 68);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(data[35], 0x01);
        assert_eq!(data[67], 100);
    }

    #[test]
    fn dynamic_bytes_go_to_the_tail() {
        let data = encode_function_call([0u8; 4], &[AbiParam::Bytes(vec![0xca, 0xfe])]);

        // selector + offset + length + one padded word
        assert_eq!(data.len(), 4 + 32 * 3);
        assert_eq!(decode_uint256(&data[4..36]).unwrap(), U256::from(32));
        assert_eq!(decode_uint256(&data[36..68]).unwrap(), U256::from(2));
        assert_eq!(&data[68..70], &[0xca, 0xfe]);
        assert!(data[70..].iter().all(|b| *b == 0));
    }

    #[test]
    fn dynamic_offset_skips_static_head() {
        let params = [
            AbiParam::Uint(U256::from(1)),
            AbiParam::Bytes(vec![]),
            AbiParam::Uint(U256::from(2)),
        ];
        let data = encode_function_call([0u8; 4], &params);

        assert_eq!(decode_uint256(&data[36..68]).unwrap(), U256::from(96));
        // empty bytes: length word only
        assert_eq!(data.len(), 4 + 32 * 4);
    }

    #[test]
    fn decode_uint256_valid() {
        let mut data = vec![0u8; 64];
        data[31] = 42;
        data[63] = 99;
        assert_eq!(decode_uint256(&data).unwrap(), U256::from(42));
    }

    #[test]
    fn decode_uint256_too_short() {
        assert!(decode_uint256(&[0u8; 16]).is_err());
    }
}
