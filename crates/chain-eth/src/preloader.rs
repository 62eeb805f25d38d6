use alloy_primitives::U256;
use chain_rpc::quantity::from_hex_data;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use wallet_types::{
    select_quote, ApprovalData, FeePriority, FeeQuote, FeeShape, Intent, IntentAction, StakeAction,
    SwapData,
};

use crate::chains::EvmChain;
use crate::client::{EvmCall, EvmClient};
use crate::error::EthError;
use crate::fee::EvmFeeCalculator;
use crate::stake_hub::{self, STAKE_HUB};
use crate::{erc20, nft};

/// Everything the sign client needs besides the intent and the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmSignData {
    pub chain_id: u64,
    pub nonce: u64,
    /// One quote per priority rank.
    pub fees: Vec<FeeQuote>,
    /// StakeHub address for stake intents.
    pub stake_target: Option<String>,
}

impl EvmSignData {
    pub fn fee(&self, priority: FeePriority) -> Option<&FeeQuote> {
        select_quote(&self.fees, priority)
    }
}

/// Gas price the quote pays per unit: `max_fee_per_gas` or the legacy price.
pub fn max_fee_per_gas(shape: &FeeShape) -> Option<U256> {
    match shape {
        FeeShape::Eip1559 {
            max_fee_per_gas, ..
        } => Some(*max_fee_per_gas),
        FeeShape::Regular { gas_price, .. } => Some(*gas_price),
        FeeShape::Flat | FeeShape::Solana { .. } => None,
    }
}

/// The call an intent makes on chain.
pub fn call_for(intent: &Intent, chain: &EvmChain) -> Result<EvmCall, EthError> {
    let call = match &intent.action {
        IntentAction::NativeTransfer => EvmCall {
            to: intent.require_destination()?.to_string(),
            value: intent.amount,
            data: payload(intent.memo.as_deref())?,
        },
        IntentAction::TokenTransfer => {
            let token = intent.asset.token_id.as_deref().ok_or_else(|| {
                EthError::TransactionBuildError("token transfer without token id".into())
            })?;
            EvmCall {
                to: token.to_lowercase(),
                value: U256::ZERO,
                data: erc20::encode_transfer(intent.require_destination()?, intent.amount)?,
            }
        }
        IntentAction::GenericTransfer { .. } => EvmCall {
            to: intent.require_destination()?.to_string(),
            value: intent.amount,
            data: payload(intent.memo.as_deref())?,
        },
        IntentAction::TokenApproval(approval) => approval_call(approval, intent.memo.as_deref())?,
        IntentAction::Stake(action) => {
            if !chain.stake_hub {
                return Err(EthError::UnsupportedOperation(format!(
                    "staking on {}",
                    chain.name
                )));
            }
            let value = match action {
                StakeAction::Delegate { .. } => intent.amount,
                _ => U256::ZERO,
            };
            EvmCall {
                to: STAKE_HUB.to_string(),
                value,
                data: stake_hub::encode_stake(action, intent.amount)?,
            }
        }
        IntentAction::Swap(swap) => swap_call(swap)?,
        IntentAction::NftTransfer(asset) => EvmCall {
            to: asset.contract.clone(),
            value: U256::ZERO,
            data: nft::encode_safe_transfer(
                &intent.from.address,
                intent.require_destination()?,
                asset,
            )?,
        },
        IntentAction::AccountActivation => {
            return Err(EthError::UnsupportedOperation(format!(
                "account activation on {}",
                chain.name
            )))
        }
    };
    Ok(call)
}

/// `approve(spender, MAX)` on the token, unless the caller supplied the
/// call data.
pub fn approval_call(approval: &ApprovalData, data: Option<&str>) -> Result<EvmCall, EthError> {
    let data = match data {
        Some(hex) if !hex.is_empty() => from_hex_data(hex)?,
        _ => erc20::encode_approve(&approval.spender, U256::MAX)?,
    };
    Ok(EvmCall {
        to: approval.token.clone(),
        value: U256::ZERO,
        data,
    })
}

pub fn swap_call(swap: &SwapData) -> Result<EvmCall, EthError> {
    Ok(EvmCall {
        to: swap.to.clone(),
        value: swap.value,
        data: from_hex_data(&swap.data)?,
    })
}

/// Memo bytes for value calls. A `0x` memo is call data, anything else is
/// sent as UTF-8.
fn payload(memo: Option<&str>) -> Result<Vec<u8>, EthError> {
    match memo {
        None | Some("") => Ok(Vec::new()),
        Some(hex) if hex.starts_with("0x") => Ok(from_hex_data(hex)?),
        Some(text) => Ok(text.as_bytes().to_vec()),
    }
}

/// Fetches nonce and fees for an intent.
#[derive(Debug, Clone)]
pub struct EvmPreloader {
    client: EvmClient,
    chain: EvmChain,
}

impl EvmPreloader {
    pub fn new(client: EvmClient, chain: EvmChain) -> Self {
        Self { client, chain }
    }

    #[instrument(skip_all, fields(chain = %self.chain.chain, from = %intent.from.address))]
    pub async fn preload(&self, intent: &Intent) -> Result<EvmSignData, EthError> {
        match &intent.action {
            IntentAction::Swap(swap) => match &swap.approval {
                Some(approval) => self.preload_swap_with_approval(intent, swap, approval).await,
                None => self.preload_call(intent, &swap_call(swap)?).await,
            },
            _ => self.preload_call(intent, &call_for(intent, &self.chain)?).await,
        }
    }

    async fn preload_call(&self, intent: &Intent, call: &EvmCall) -> Result<EvmSignData, EthError> {
        let (nonce, fees) = EvmFeeCalculator::new(self.client.clone(), self.chain.clone())
            .calculate(intent, call)
            .await?;

        Ok(EvmSignData {
            chain_id: self.chain.chain_id,
            nonce,
            fees,
            stake_target: matches!(intent.action, IntentAction::Stake(_))
                .then(|| STAKE_HUB.to_string()),
        })
    }

    /// The swap cannot be simulated before the allowance exists, so fees are
    /// priced on the approval and the swap's quoted gas limit is added on top.
    async fn preload_swap_with_approval(
        &self,
        intent: &Intent,
        swap: &SwapData,
        approval: &ApprovalData,
    ) -> Result<EvmSignData, EthError> {
        let swap_gas_limit = swap.gas_limit.ok_or_else(|| {
            EthError::TransactionBuildError("swap gas limit required with approval".into())
        })?;
        let approval_intent = Intent::approval(intent.from.clone(), approval.clone());
        let mut data = self
            .preload_call(&approval_intent, &approval_call(approval, None)?)
            .await?;

        for quote in &mut data.fees {
            let (Some(approval_limit), Some(max_fee)) =
                (quote.shape.gas_limit(), max_fee_per_gas(&quote.shape))
            else {
                continue;
            };
            quote.amount = approval_limit
                .saturating_mul(max_fee)
                .saturating_add(swap_gas_limit.saturating_mul(max_fee));
        }
        info!(provider = %swap.provider, "swap needs approval");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{BSC, ETHEREUM};
    use chain_rpc::mock::MockTransport;
    use chain_rpc::quantity::to_hex_data;
    use serde_json::json;
    use std::sync::Arc;
    use wallet_types::{Account, AssetId, Chain, DelegationRef, NftAsset, NftStandard};

    const FROM: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
    const TO: &str = "0x000000000000000000000000000000000000dEaD";
    const TOKEN: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    fn account(chain: Chain) -> Account {
        Account::new(chain, FROM)
    }

    fn market_mock() -> MockTransport {
        MockTransport::new()
            .with("eth_getTransactionCount", json!("0x7"))
            .with("eth_estimateGas", json!("0x5208"))
            .with(
                "eth_feeHistory",
                json!({"baseFeePerGas": ["0xa"], "reward": [["0xa", "0xa", "0xa"]]}),
            )
    }

    fn preloader(mock: Arc<MockTransport>, mut chain: EvmChain) -> EvmPreloader {
        chain.fee.min_priority_fee = 1;
        EvmPreloader::new(EvmClient::new(mock), chain)
    }

    #[test]
    fn native_call_carries_amount_and_memo() {
        let intent = Intent::native_transfer(account(Chain::Ethereum), TO, U256::from(5))
            .with_memo("0xcafe");
        let call = call_for(&intent, &ETHEREUM).unwrap();
        assert_eq!(call.to, TO);
        assert_eq!(call.value, U256::from(5));
        assert_eq!(call.data, vec![0xca, 0xfe]);
    }

    #[test]
    fn text_memo_is_sent_as_utf8() {
        let intent =
            Intent::native_transfer(account(Chain::Ethereum), TO, U256::from(5)).with_memo("hi");
        assert_eq!(call_for(&intent, &ETHEREUM).unwrap().data, b"hi".to_vec());
    }

    #[test]
    fn token_call_targets_lowercased_contract() {
        let intent = Intent::token_transfer(account(Chain::Ethereum), TOKEN, TO, U256::from(9));
        let call = call_for(&intent, &ETHEREUM).unwrap();
        assert_eq!(call.to, TOKEN.to_lowercase());
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(call.data, erc20::encode_transfer(TO, U256::from(9)).unwrap());
    }

    #[test]
    fn approval_defaults_to_unlimited() {
        let approval = ApprovalData {
            token: TOKEN.into(),
            spender: TO.into(),
        };
        let call = call_for(&Intent::approval(account(Chain::Ethereum), approval), &ETHEREUM)
            .unwrap();
        assert_eq!(call.to, TOKEN);
        assert_eq!(call.data, erc20::encode_approve(TO, U256::MAX).unwrap());
    }

    #[test]
    fn nft_call_uses_safe_transfer() {
        let asset = NftAsset {
            contract: TOKEN.into(),
            token_id: U256::from(3),
            standard: NftStandard::Erc721,
        };
        let intent = Intent::nft_transfer(account(Chain::Ethereum), TO, asset.clone());
        let call = call_for(&intent, &ETHEREUM).unwrap();
        assert_eq!(call.to, TOKEN);
        assert_eq!(call.data, nft::encode_safe_transfer(FROM, TO, &asset).unwrap());
    }

    #[test]
    fn stake_values_only_delegate() {
        let delegate = Intent::stake(
            account(Chain::SmartChain),
            U256::from(10),
            StakeAction::Delegate {
                validator: TO.into(),
            },
        );
        let undelegate = Intent::stake(
            account(Chain::SmartChain),
            U256::from(10),
            StakeAction::Undelegate {
                delegation: DelegationRef {
                    validator: TO.into(),
                    delegation_id: String::new(),
                    shares: U256::from(10),
                    balance: U256::from(10),
                },
            },
        );

        let call = call_for(&delegate, &BSC).unwrap();
        assert_eq!(call.to, STAKE_HUB);
        assert_eq!(call.value, U256::from(10));
        assert_eq!(call_for(&undelegate, &BSC).unwrap().value, U256::ZERO);
    }

    #[test]
    fn stake_outside_stake_hub_chains_is_unsupported() {
        let intent = Intent::stake(
            account(Chain::Ethereum),
            U256::from(10),
            StakeAction::Delegate {
                validator: TO.into(),
            },
        );
        assert!(matches!(
            call_for(&intent, &ETHEREUM),
            Err(EthError::UnsupportedOperation(_))
        ));
    }

    #[tokio::test]
    async fn preload_returns_nonce_and_three_quotes() {
        let mock = Arc::new(market_mock());
        let intent = Intent::native_transfer(
            account(Chain::Ethereum),
            TO,
            U256::from(1_000_000_000_000_000_000u128),
        );

        let data = preloader(mock.clone(), ETHEREUM).preload(&intent).await.unwrap();

        assert_eq!(data.chain_id, 1);
        assert_eq!(data.nonce, 7);
        assert_eq!(data.fees.len(), 3);
        assert_eq!(data.fee(FeePriority::Normal).unwrap().amount, U256::from(420_000));
        assert!(data.stake_target.is_none());
        assert_eq!(
            mock.params_of("eth_getTransactionCount").unwrap(),
            json!([FROM, "latest"])
        );
    }

    #[tokio::test]
    async fn preload_is_idempotent_for_fixed_responses() {
        let mock = Arc::new(market_mock());
        let intent = Intent::native_transfer(account(Chain::Ethereum), TO, U256::from(1));
        let preloader = preloader(mock, ETHEREUM);

        let first = preloader.preload(&intent).await.unwrap();
        let second = preloader.preload(&intent).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn swap_with_approval_prices_both_legs() {
        let mock = Arc::new(market_mock().with_matching(
            "eth_estimateGas",
            TOKEN,
            json!("0xc350"),
        ));
        let swap = SwapData {
            provider: "uniswap".into(),
            to: TO.into(),
            value: U256::ZERO,
            data: to_hex_data(&[1, 2, 3]),
            approval: Some(ApprovalData {
                token: TOKEN.into(),
                spender: TO.into(),
            }),
            gas_limit: Some(U256::from(100_000)),
        };
        let intent = Intent::swap(
            account(Chain::Ethereum),
            AssetId::token(Chain::Ethereum, TOKEN),
            U256::from(5),
            swap,
        );

        let data = preloader(mock.clone(), ETHEREUM).preload(&intent).await.unwrap();

        // approval: 50_000 * 1.5 = 75_000 gas, plus the swap's 100_000, at 20 wei
        for quote in &data.fees {
            assert_eq!(quote.amount, U256::from((75_000 + 100_000) * 20));
            assert_eq!(quote.shape.gas_limit(), Some(U256::from(75_000)));
        }
        let estimate = mock.params_of("eth_estimateGas").unwrap();
        assert_eq!(estimate[0]["to"], TOKEN);
    }

    #[tokio::test]
    async fn swap_with_approval_requires_gas_limit() {
        let mock = Arc::new(market_mock());
        let swap = SwapData {
            provider: "uniswap".into(),
            to: TO.into(),
            value: U256::ZERO,
            data: "0x".into(),
            approval: Some(ApprovalData {
                token: TOKEN.into(),
                spender: TO.into(),
            }),
            gas_limit: None,
        };
        let intent = Intent::swap(
            account(Chain::Ethereum),
            AssetId::native(Chain::Ethereum),
            U256::ZERO,
            swap,
        );

        let err = preloader(mock, ETHEREUM).preload(&intent).await.unwrap_err();
        assert!(matches!(err, EthError::TransactionBuildError(_)));
    }

    #[tokio::test]
    async fn stake_preload_sets_stake_target() {
        let mock = Arc::new(market_mock());
        let intent = Intent::stake(
            account(Chain::SmartChain),
            U256::from(10),
            StakeAction::Delegate {
                validator: TO.into(),
            },
        );

        let data = preloader(mock.clone(), BSC).preload(&intent).await.unwrap();

        assert_eq!(data.chain_id, 56);
        assert_eq!(data.stake_target.as_deref(), Some(STAKE_HUB));
        let estimate = mock.params_of("eth_estimateGas").unwrap();
        assert_eq!(estimate[0]["to"], STAKE_HUB);
        assert_eq!(estimate[0]["value"], "0xa");
    }
}
