use alloy_primitives::U256;
use wallet_types::{NftAsset, NftStandard};

use crate::abi::{encode_function_call, AbiParam};
use crate::address::parse_address;
use crate::error::EthError;

/// ERC-721 `safeTransferFrom(address,address,uint256)`: `0x42842e0e`.
const ERC721_SAFE_TRANSFER_FROM: [u8; 4] = [0x42, 0x84, 0x2e, 0x0e];

/// ERC-1155 `safeTransferFrom(address,address,uint256,uint256,bytes)`:
/// `0xf242432a`.
const ERC1155_SAFE_TRANSFER_FROM: [u8; 4] = [0xf2, 0x42, 0x43, 0x2a];

/// Call data moving one NFT from `from` to `to`. ERC-1155 transfers a single
/// unit with empty data.
pub fn encode_safe_transfer(from: &str, to: &str, nft: &NftAsset) -> Result<Vec<u8>, EthError> {
    let from = AbiParam::Address(parse_address(from)?.into());
    let to = AbiParam::Address(parse_address(to)?.into());
    let id = AbiParam::Uint(nft.token_id);

    let data = match nft.standard {
        NftStandard::Erc721 => encode_function_call(ERC721_SAFE_TRANSFER_FROM, &[from, to, id]),
        NftStandard::Erc1155 => encode_function_call(
            ERC1155_SAFE_TRANSFER_FROM,
            &[from, to, id, AbiParam::Uint(U256::from(1)), AbiParam::Bytes(Vec::new())],
        ),
    };
    Ok(data)
}
