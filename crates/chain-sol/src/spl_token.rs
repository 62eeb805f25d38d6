//! SPL Token and Token-2022 instructions and associated token accounts.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::bytes_to_address;
use crate::error::SolError;
use crate::system::SYSTEM_PROGRAM_ID;
use crate::transaction::{SolAccountMeta, SolInstruction};

/// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
];

/// `TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb`
pub const TOKEN_2022_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xee, 0x75, 0x8f, 0xde, 0x18, 0x42, 0x5d, 0xbc, 0xe4, 0x6c, 0xcd,
    0xda, 0xb6, 0x1a, 0xfc, 0x4d, 0x83, 0xb9, 0x0d, 0x27, 0xfe, 0xbd, 0xf9, 0x28, 0xd8, 0xa1,
    0x8b, 0xfc,
];

/// `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d,
    0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9,
    0xf8, 0x59,
];

/// Size of a token account without extensions; rent for a new recipient
/// account is priced on it.
pub const TOKEN_ACCOUNT_SIZE: u64 = 165;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";
const TRANSFER_CHECKED: u8 = 12;
const CREATE_IDEMPOTENT: u8 = 1;

/// The program that owns a mint and its token accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenProgram {
    #[default]
    Token,
    Token2022,
}

impl TokenProgram {
    pub fn id(&self) -> [u8; 32] {
        match self {
            TokenProgram::Token => TOKEN_PROGRAM_ID,
            TokenProgram::Token2022 => TOKEN_2022_PROGRAM_ID,
        }
    }

    /// Resolves the `owner` field of a token account.
    pub fn from_owner(owner: &str) -> Result<Self, SolError> {
        if owner == bytes_to_address(&TOKEN_PROGRAM_ID) {
            Ok(TokenProgram::Token)
        } else if owner == bytes_to_address(&TOKEN_2022_PROGRAM_ID) {
            Ok(TokenProgram::Token2022)
        } else {
            Err(SolError::UnknownTokenProgram(owner.to_string()))
        }
    }
}

/// `TransferChecked`: `amount` base units of `mint` with its `decimals`.
pub fn transfer_checked(
    program: TokenProgram,
    source: &[u8; 32],
    mint: &[u8; 32],
    destination: &[u8; 32],
    owner: &[u8; 32],
    amount: u64,
    decimals: u8,
) -> SolInstruction {
    let mut data = Vec::with_capacity(10);
    data.push(TRANSFER_CHECKED);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(decimals);

    SolInstruction {
        program_id: program.id(),
        accounts: vec![
            SolAccountMeta::writable(*source, false),
            SolAccountMeta::readonly(*mint, false),
            SolAccountMeta::writable(*destination, false),
            SolAccountMeta::readonly(*owner, true),
        ],
        data,
    }
}

/// Creates `wallet`'s associated account for `mint` unless it already
/// exists. Returns the instruction and the account address.
pub fn create_associated_token_account_idempotent(
    payer: &[u8; 32],
    wallet: &[u8; 32],
    mint: &[u8; 32],
    program: TokenProgram,
) -> Result<(SolInstruction, [u8; 32]), SolError> {
    let ata = derive_associated_token_address(wallet, mint, program)?;
    let ix = SolInstruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*payer, true),
            SolAccountMeta::writable(ata, false),
            SolAccountMeta::readonly(*wallet, false),
            SolAccountMeta::readonly(*mint, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            SolAccountMeta::readonly(program.id(), false),
        ],
        data: vec![CREATE_IDEMPOTENT],
    };
    Ok((ix, ata))
}

/// Associated token account of `wallet` for `mint` under `program`: the PDA
/// of `[wallet, program_id, mint]` under the associated token program.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
    program: TokenProgram,
) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[wallet.as_ref(), &program.id(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// Searches bumps from 255 down for a hash that is off the Ed25519 curve.
fn find_program_address(seeds: &[&[u8]], program_id: &[u8; 32]) -> Result<([u8; 32], u8), SolError> {
    (0u8..=255)
        .rev()
        .find_map(|bump| try_create_program_address(seeds, bump, program_id).map(|a| (a, bump)))
        .ok_or_else(|| SolError::InvalidAddress("could not find valid PDA bump seed".into()))
}

fn try_create_program_address(seeds: &[&[u8]], bump: u8, program_id: &[u8; 32]) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    (!is_on_curve(&hash)).then_some(hash)
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}
