//! BSC StakeHub system contract: call encoding and reader decoding.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use wallet_types::{
    AssetId, Chain, Delegation, DelegationRef, DelegationState, DelegationValidator, StakeAction,
};

use crate::address::parse_address;
use crate::error::EthError;

/// StakeHub system contract.
pub const STAKE_HUB: &str = "0x0000000000000000000000000000000000002002";

/// Read-only helper contract batching validator and delegation views.
pub const HUB_READER: &str = "0x830295c0abe7358f7e24bc38408095621474280b";

sol! {
    struct Validator {
        address operatorAddress;
        string moniker;
        uint64 commission;
        bool jailed;
        uint64 apy;
    }

    struct HubDelegation {
        address delegatorAddress;
        address validatorAddress;
        uint256 shares;
        uint256 amount;
    }

    struct HubUndelegation {
        address delegatorAddress;
        address validatorAddress;
        uint256 shares;
        uint256 amount;
        uint256 unlockTime;
    }

    interface IStakeHub {
        function delegate(address operatorAddress, bool delegateVotePower) external payable;
        function undelegate(address operatorAddress, uint256 shares) external;
        function redelegate(address srcValidator, address dstValidator, uint256 shares, bool delegateVotePower) external;
        function claim(address operatorAddress, uint256 requestNumber) external;
        function maxElectedValidators() external view returns (uint256);
    }

    interface IHubReader {
        function getValidators(uint16 offset, uint16 limit) external view returns (Validator[] memory);
        function getDelegations(address delegator, uint16 offset, uint16 limit) external view returns (HubDelegation[] memory);
        function getUndelegations(address delegator, uint16 offset, uint16 limit) external view returns (HubUndelegation[] memory);
    }
}

/// Shares corresponding to `amount` of a delegation's balance, truncated and
/// capped at the shares held.
pub fn shares_for(amount: U256, delegation: &DelegationRef) -> Result<U256, EthError> {
    if delegation.balance.is_zero() {
        return Err(EthError::TransactionBuildError(format!(
            "delegation {} has no balance",
            delegation.delegation_id
        )));
    }
    let shares = amount
        .checked_mul(delegation.shares)
        .ok_or_else(|| EthError::TransactionBuildError("share amount overflows".into()))?
        / delegation.balance;
    Ok(shares.min(delegation.shares))
}

/// Calldata for a stake action sent to [`STAKE_HUB`].
pub fn encode_stake(action: &StakeAction, amount: U256) -> Result<Vec<u8>, EthError> {
    let data = match action {
        StakeAction::Delegate { validator } => IStakeHub::delegateCall {
            operatorAddress: parse_address(validator)?,
            delegateVotePower: false,
        }
        .abi_encode(),
        StakeAction::Undelegate { delegation } => IStakeHub::undelegateCall {
            operatorAddress: parse_address(&delegation.validator)?,
            shares: shares_for(amount, delegation)?,
        }
        .abi_encode(),
        StakeAction::Redelegate {
            delegation,
            to_validator,
        } => IStakeHub::redelegateCall {
            srcValidator: parse_address(&delegation.validator)?,
            dstValidator: parse_address(to_validator)?,
            shares: shares_for(amount, delegation)?,
            delegateVotePower: false,
        }
        .abi_encode(),
        StakeAction::Withdraw { delegation } => IStakeHub::claimCall {
            operatorAddress: parse_address(&delegation.validator)?,
            requestNumber: U256::ZERO,
        }
        .abi_encode(),
        StakeAction::ClaimRewards { .. } => {
            return Err(EthError::UnsupportedOperation(
                "claiming rewards on smartchain".into(),
            ))
        }
    };
    Ok(data)
}

pub fn encode_max_elected_validators() -> Vec<u8> {
    IStakeHub::maxElectedValidatorsCall {}.abi_encode()
}

/// Elected validator count, saturated to the reader's `uint16` page size.
pub fn decode_max_elected_validators(data: &[u8]) -> Result<u16, EthError> {
    let max = IStakeHub::maxElectedValidatorsCall::abi_decode_returns(data)
        .map_err(|e| EthError::EncodingError(format!("maxElectedValidators: {e}")))?;
    Ok(u16::try_from(max).unwrap_or(u16::MAX))
}

pub fn encode_validators_call(limit: u16) -> Vec<u8> {
    IHubReader::getValidatorsCall {
        offset: 0,
        limit,
    }
    .abi_encode()
}

pub fn decode_validators(data: &[u8]) -> Result<Vec<DelegationValidator>, EthError> {
    let validators = IHubReader::getValidatorsCall::abi_decode_returns(data)
        .map_err(|e| EthError::EncodingError(format!("getValidators: {e}")))?;
    Ok(validators
        .into_iter()
        .map(|v| DelegationValidator {
            chain: Chain::SmartChain,
            id: v.operatorAddress.to_checksum(None),
            name: v.moniker,
            is_active: !v.jailed,
            commission: v.commission as f64 / 100.0,
            apr: v.apy as f64 / 100.0,
        })
        .collect())
}

pub fn encode_delegations_call(delegator: &str, limit: u16) -> Result<Vec<u8>, EthError> {
    Ok(IHubReader::getDelegationsCall {
        delegator: parse_address(delegator)?,
        offset: 0,
        limit,
    }
    .abi_encode())
}

pub fn decode_delegations(data: &[u8]) -> Result<Vec<Delegation>, EthError> {
    let delegations = IHubReader::getDelegationsCall::abi_decode_returns(data)
        .map_err(|e| EthError::EncodingError(format!("getDelegations: {e}")))?;
    Ok(delegations
        .into_iter()
        .map(|d| delegation(d.validatorAddress, String::new(), d.amount, d.shares, None))
        .collect())
}

pub fn encode_undelegations_call(delegator: &str, limit: u16) -> Result<Vec<u8>, EthError> {
    Ok(IHubReader::getUndelegationsCall {
        delegator: parse_address(delegator)?,
        offset: 0,
        limit,
    }
    .abi_encode())
}

pub fn decode_undelegations(data: &[u8]) -> Result<Vec<Delegation>, EthError> {
    let undelegations = IHubReader::getUndelegationsCall::abi_decode_returns(data)
        .map_err(|e| EthError::EncodingError(format!("getUndelegations: {e}")))?;
    Ok(undelegations
        .into_iter()
        .map(|u| {
            let unlock = u64::try_from(u.unlockTime).unwrap_or(u64::MAX);
            let validator = u.validatorAddress.to_checksum(None);
            let id = format!("{validator}--{unlock}");
            delegation(u.validatorAddress, id, u.amount, u.shares, Some(unlock))
        })
        .collect())
}

fn delegation(
    validator: Address,
    delegation_id: String,
    balance: U256,
    shares: U256,
    unlock_time: Option<u64>,
) -> Delegation {
    Delegation {
        asset: AssetId::native(Chain::SmartChain),
        validator_id: validator.to_checksum(None),
        delegation_id,
        balance,
        shares,
        rewards: U256::ZERO,
        unlock_time,
        base_state: DelegationState::Active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    const VALIDATOR: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const OTHER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
    const DELEGATOR: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    fn delegation_ref(balance: u64, shares: u64) -> DelegationRef {
        DelegationRef {
            validator: VALIDATOR.into(),
            delegation_id: String::new(),
            shares: U256::from(shares),
            balance: U256::from(balance),
        }
    }

    #[test]
    fn shares_scale_with_amount() {
        let d = delegation_ref(1_000, 900);
        assert_eq!(shares_for(U256::from(500), &d).unwrap(), U256::from(450));
        // truncated
        assert_eq!(shares_for(U256::from(1), &d).unwrap(), U256::ZERO);
    }

    #[test]
    fn shares_never_exceed_holdings() {
        let d = delegation_ref(1_000, 900);
        assert_eq!(shares_for(U256::from(5_000), &d).unwrap(), U256::from(900));
    }

    #[test]
    fn zero_balance_is_an_error() {
        let d = delegation_ref(0, 900);
        assert!(shares_for(U256::from(1), &d).is_err());
    }

    #[test]
    fn delegate_encodes_validator_without_vote_power() {
        let action = StakeAction::Delegate {
            validator: VALIDATOR.into(),
        };
        let data = encode_stake(&action, U256::from(10)).unwrap();

        let decoded = IStakeHub::delegateCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.operatorAddress, parse_address(VALIDATOR).unwrap());
        assert!(!decoded.delegateVotePower);
    }

    #[test]
    fn undelegate_converts_amount_to_shares() {
        let action = StakeAction::Undelegate {
            delegation: delegation_ref(2_000, 1_000),
        };
        let data = encode_stake(&action, U256::from(1_000)).unwrap();

        assert_eq!(&data[..4], &IStakeHub::undelegateCall::SELECTOR);
        let decoded = IStakeHub::undelegateCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.shares, U256::from(500));
    }

    #[test]
    fn redelegate_moves_shares_between_validators() {
        let action = StakeAction::Redelegate {
            delegation: delegation_ref(100, 100),
            to_validator: OTHER.into(),
        };
        let data = encode_stake(&action, U256::from(40)).unwrap();

        let decoded = IStakeHub::redelegateCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.srcValidator, parse_address(VALIDATOR).unwrap());
        assert_eq!(decoded.dstValidator, parse_address(OTHER).unwrap());
        assert_eq!(decoded.shares, U256::from(40));
        assert!(!decoded.delegateVotePower);
    }

    #[test]
    fn withdraw_claims_all_requests() {
        let action = StakeAction::Withdraw {
            delegation: delegation_ref(100, 100),
        };
        let data = encode_stake(&action, U256::ZERO).unwrap();
        let decoded = IStakeHub::claimCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.requestNumber, U256::ZERO);
    }

    #[test]
    fn claim_rewards_is_unsupported() {
        let action = StakeAction::ClaimRewards { validators: vec![] };
        assert!(matches!(
            encode_stake(&action, U256::ZERO),
            Err(EthError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn max_elected_validators_selector() {
        assert_eq!(encode_max_elected_validators(), vec![0xc4, 0x73, 0x31, 0x8f]);
        let data = U256::from(45).abi_encode();
        assert_eq!(decode_max_elected_validators(&data).unwrap(), 45);
    }

    #[test]
    fn validators_map_percentages_and_jail_state() {
        let validators = vec![
            Validator {
                operatorAddress: parse_address(VALIDATOR).unwrap(),
                moniker: "Legend".into(),
                commission: 1_000,
                jailed: false,
                apy: 250,
            },
            Validator {
                operatorAddress: parse_address(OTHER).unwrap(),
                moniker: "Jailed".into(),
                commission: 500,
                jailed: true,
                apy: 0,
            },
        ];
        let data = (validators,).abi_encode_params();

        let decoded = decode_validators(&data).unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].id, VALIDATOR);
        assert_eq!(decoded[0].commission, 10.0);
        assert_eq!(decoded[0].apr, 2.5);
        assert!(decoded[0].is_active);
        assert!(!decoded[1].is_active);
    }

    #[test]
    fn undelegations_carry_unlock_time_in_id() {
        let undelegations = vec![HubUndelegation {
            delegatorAddress: parse_address(DELEGATOR).unwrap(),
            validatorAddress: parse_address(VALIDATOR).unwrap(),
            shares: U256::from(9),
            amount: U256::from(10),
            unlockTime: U256::from(1_700_000_000u64),
        }];
        let data = (undelegations,).abi_encode_params();

        let decoded = decode_undelegations(&data).unwrap();

        assert_eq!(decoded[0].delegation_id, format!("{VALIDATOR}--1700000000"));
        assert_eq!(decoded[0].unlock_time, Some(1_700_000_000));
        assert_eq!(decoded[0].state_at(1_600_000_000), DelegationState::Undelegating);
        assert_eq!(decoded[0].state_at(1_800_000_000), DelegationState::AwaitingWithdrawal);
    }

    #[test]
    fn delegations_are_active() {
        let delegations = vec![HubDelegation {
            delegatorAddress: parse_address(DELEGATOR).unwrap(),
            validatorAddress: parse_address(VALIDATOR).unwrap(),
            shares: U256::from(9),
            amount: U256::from(10),
        }];
        let data = (delegations,).abi_encode_params();

        let decoded = decode_delegations(&data).unwrap();

        assert_eq!(decoded[0].balance, U256::from(10));
        assert_eq!(decoded[0].delegation_id, "");
        assert_eq!(decoded[0].state(), DelegationState::Active);
    }

    #[test]
    fn delegation_calls_encode_delegator() {
        let data = encode_delegations_call(DELEGATOR, 45).unwrap();
        let decoded = IHubReader::getDelegationsCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.delegator, parse_address(DELEGATOR).unwrap());
        assert_eq!(decoded.limit, 45);
        assert_eq!(decoded.offset, 0);
    }

    #[test]
    fn garbage_reader_output_is_a_decode_error() {
        assert!(matches!(
            decode_validators(&[1, 2, 3]),
            Err(EthError::EncodingError(_))
        ));
    }
}
