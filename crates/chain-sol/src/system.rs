//! System program instructions.

use crate::transaction::{SolAccountMeta, SolInstruction};

/// `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

const CREATE_ACCOUNT_WITH_SEED: u32 = 3;
const TRANSFER: u32 = 2;

/// Moves `lamports` from `from` to `to`.
pub fn transfer(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> SolInstruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    SolInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*from, true),
            SolAccountMeta::writable(*to, false),
        ],
        data,
    }
}

/// Creates `new_account` at the address derived from `base` and `seed`,
/// funded by `base` and owned by `owner`.
pub fn create_account_with_seed(
    base: &[u8; 32],
    new_account: &[u8; 32],
    seed: &str,
    lamports: u64,
    space: u64,
    owner: &[u8; 32],
) -> SolInstruction {
    let mut data = Vec::with_capacity(4 + 32 + 8 + seed.len() + 8 + 8 + 32);
    data.extend_from_slice(&CREATE_ACCOUNT_WITH_SEED.to_le_bytes());
    data.extend_from_slice(base);
    data.extend_from_slice(&(seed.len() as u64).to_le_bytes());
    data.extend_from_slice(seed.as_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data.extend_from_slice(&space.to_le_bytes());
    data.extend_from_slice(owner);

    SolInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*base, true),
            SolAccountMeta::writable(*new_account, false),
        ],
        data,
    }
}
