//! Native stake program instructions.

use crate::address::create_with_seed;
use crate::error::SolError;
use crate::system::create_account_with_seed;
use crate::transaction::{SolAccountMeta, SolInstruction};

/// `Stake11111111111111111111111111111111111111`
pub const STAKE_PROGRAM_ID: [u8; 32] = [
    0x06, 0xa1, 0xd8, 0x17, 0x91, 0x37, 0x54, 0x2a, 0x98, 0x34, 0x37, 0xbd, 0xfe, 0x2a, 0x7a,
    0xb2, 0x55, 0x7f, 0x53, 0x5c, 0x8a, 0x78, 0x72, 0x2b, 0x68, 0xa4, 0x9d, 0xc0, 0x00, 0x00,
    0x00, 0x00,
];

/// `StakeConfig11111111111111111111111111111111`
pub const STAKE_CONFIG_ID: [u8; 32] = [
    0x06, 0xa1, 0xd8, 0x17, 0xa5, 0x02, 0x05, 0x0b, 0x68, 0x07, 0x91, 0xe6, 0xce, 0x6d, 0xb8,
    0x8e, 0x1e, 0x5b, 0x71, 0x50, 0xf6, 0x1f, 0xc6, 0x79, 0x0a, 0x4e, 0xb4, 0xd1, 0x00, 0x00,
    0x00, 0x00,
];

/// `SysvarRent111111111111111111111111111111111`
pub const SYSVAR_RENT_ID: [u8; 32] = [
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a, 0xf1,
    0x7f, 0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a, 0x00, 0x00,
    0x00, 0x00,
];

/// `SysvarC1ock11111111111111111111111111111111`
pub const SYSVAR_CLOCK_ID: [u8; 32] = [
    0x06, 0xa7, 0xd5, 0x17, 0x18, 0xc7, 0x74, 0xc9, 0x28, 0x56, 0x63, 0x98, 0x69, 0x1d, 0x5e,
    0xb6, 0x8b, 0x5e, 0xb8, 0xa3, 0x9b, 0x4b, 0x6d, 0x5c, 0x73, 0x55, 0x5b, 0x21, 0x00, 0x00,
    0x00, 0x00,
];

/// `SysvarStakeHistory1111111111111111111111111`
pub const SYSVAR_STAKE_HISTORY_ID: [u8; 32] = [
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x35, 0x84, 0xd0, 0xfe, 0xed, 0x9b, 0xb3, 0x43, 0x1d, 0x13,
    0x20, 0x6b, 0xe5, 0x44, 0x28, 0x1b, 0x57, 0xb8, 0x56, 0x6c, 0xc5, 0x37, 0x5f, 0xf4, 0x00,
    0x00, 0x00,
];

/// Size of a stake account.
pub const STAKE_ACCOUNT_SIZE: u64 = 200;

const INITIALIZE: u32 = 0;
const DELEGATE_STAKE: u32 = 2;
const WITHDRAW: u32 = 4;
const DEACTIVATE: u32 = 5;

/// Instructions that open a stake account funded with `lamports` and
/// delegate it to `vote_account`. The account address is derived from
/// `staker` and `seed`; it is returned alongside.
pub fn delegate(
    staker: &[u8; 32],
    vote_account: &[u8; 32],
    seed: &str,
    lamports: u64,
) -> Result<(Vec<SolInstruction>, [u8; 32]), SolError> {
    let stake_account = create_with_seed(staker, seed, &STAKE_PROGRAM_ID)?;
    let instructions = vec![
        create_account_with_seed(
            staker,
            &stake_account,
            seed,
            lamports,
            STAKE_ACCOUNT_SIZE,
            &STAKE_PROGRAM_ID,
        ),
        initialize(&stake_account, staker),
        delegate_stake(&stake_account, vote_account, staker),
    ];
    Ok((instructions, stake_account))
}

/// `Initialize` with `authority` as staker and withdrawer and no lockup.
pub fn initialize(stake_account: &[u8; 32], authority: &[u8; 32]) -> SolInstruction {
    let mut data = Vec::with_capacity(4 + 64 + 48);
    data.extend_from_slice(&INITIALIZE.to_le_bytes());
    data.extend_from_slice(authority);
    data.extend_from_slice(authority);
    // lockup: unix_timestamp, epoch, custodian
    data.extend_from_slice(&0i64.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());
    data.extend_from_slice(&[0u8; 32]);

    SolInstruction {
        program_id: STAKE_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*stake_account, false),
            SolAccountMeta::readonly(SYSVAR_RENT_ID, false),
        ],
        data,
    }
}

pub fn delegate_stake(
    stake_account: &[u8; 32],
    vote_account: &[u8; 32],
    authority: &[u8; 32],
) -> SolInstruction {
    SolInstruction {
        program_id: STAKE_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*stake_account, false),
            SolAccountMeta::readonly(*vote_account, false),
            SolAccountMeta::readonly(SYSVAR_CLOCK_ID, false),
            SolAccountMeta::readonly(SYSVAR_STAKE_HISTORY_ID, false),
            SolAccountMeta::readonly(STAKE_CONFIG_ID, false),
            SolAccountMeta::readonly(*authority, true),
        ],
        data: DELEGATE_STAKE.to_le_bytes().to_vec(),
    }
}

pub fn deactivate(stake_account: &[u8; 32], authority: &[u8; 32]) -> SolInstruction {
    SolInstruction {
        program_id: STAKE_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*stake_account, false),
            SolAccountMeta::readonly(SYSVAR_CLOCK_ID, false),
            SolAccountMeta::readonly(*authority, true),
        ],
        data: DEACTIVATE.to_le_bytes().to_vec(),
    }
}

/// Withdraws `lamports` from a deactivated stake account back to `authority`.
pub fn withdraw(stake_account: &[u8; 32], authority: &[u8; 32], lamports: u64) -> SolInstruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&WITHDRAW.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    SolInstruction {
        program_id: STAKE_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*stake_account, false),
            SolAccountMeta::writable(*authority, false),
            SolAccountMeta::readonly(SYSVAR_CLOCK_ID, false),
            SolAccountMeta::readonly(SYSVAR_STAKE_HISTORY_ID, false),
            SolAccountMeta::readonly(*authority, true),
        ],
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::bytes_to_address;
    use crate::system::SYSTEM_PROGRAM_ID;

    #[test]
    fn ids_match_base58() {
        assert_eq!(
            bytes_to_address(&STAKE_PROGRAM_ID),
            "Stake11111111111111111111111111111111111111"
        );
        assert_eq!(
            bytes_to_address(&STAKE_CONFIG_ID),
            "StakeConfig11111111111111111111111111111111"
        );
        assert_eq!(
            bytes_to_address(&SYSVAR_RENT_ID),
            "SysvarRent111111111111111111111111111111111"
        );
        assert_eq!(
            bytes_to_address(&SYSVAR_CLOCK_ID),
            "SysvarC1ock11111111111111111111111111111111"
        );
        assert_eq!(
            bytes_to_address(&SYSVAR_STAKE_HISTORY_ID),
            "SysvarStakeHistory1111111111111111111111111"
        );
    }

    #[test]
    fn delegate_creates_initializes_and_delegates() {
        let staker = [1u8; 32];
        let vote = [2u8; 32];
        let (instructions, stake_account) = delegate(&staker, &vote, "seed", 1_000).unwrap();

        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(instructions[0].accounts[1].pubkey, stake_account);
        assert_eq!(&instructions[1].data[..4], &[0, 0, 0, 0]);
        assert_eq!(instructions[1].data.len(), 116);
        assert_eq!(&instructions[2].data, &[2, 0, 0, 0]);
        assert_eq!(instructions[2].accounts[1].pubkey, vote);
        assert_eq!(
            stake_account,
            create_with_seed(&staker, "seed", &STAKE_PROGRAM_ID).unwrap()
        );
    }

    #[test]
    fn deactivate_and_withdraw_layout() {
        let account = [3u8; 32];
        let authority = [4u8; 32];
        assert_eq!(deactivate(&account, &authority).data, vec![5, 0, 0, 0]);

        let ix = withdraw(&account, &authority, 42);
        assert_eq!(&ix.data[..4], &[4, 0, 0, 0]);
        assert_eq!(u64::from_le_bytes(ix.data[4..].try_into().unwrap()), 42);
        assert_eq!(ix.accounts[1].pubkey, authority);
    }
}
