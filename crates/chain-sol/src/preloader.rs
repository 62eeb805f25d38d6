use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use wallet_types::{select_quote, Chain, FeePriority, FeeQuote, Intent, IntentAction, StakeAction};

use crate::client::{SolanaClient, TokenAccount};
use crate::error::SolError;
use crate::fee::SolanaFeeCalculator;
use crate::spl_token::TokenProgram;

/// Everything the sign client needs besides the intent and the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolanaSignData {
    /// Base58 recent blockhash.
    pub blockhash: String,
    /// Sender's token account for token transfers.
    pub sender_token_address: Option<String>,
    /// Recipient's token account, `None` when it has to be created.
    pub recipient_token_address: Option<String>,
    pub token_program: TokenProgram,
    pub decimals: u8,
    /// One quote per priority rank.
    pub fees: Vec<FeeQuote>,
}

impl SolanaSignData {
    pub fn fee(&self, priority: FeePriority) -> Option<&FeeQuote> {
        select_quote(&self.fees, priority)
    }
}

/// Token accounts on both sides of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransferAccounts {
    pub sender: String,
    pub recipient: Option<String>,
    pub program: TokenProgram,
    pub decimals: u8,
}

/// Picks the sender account and resolves its program. The recipient account
/// must live under the same program to be reused.
pub fn token_transfer_accounts(
    mint: &str,
    sender: &[TokenAccount],
    recipient: &[TokenAccount],
) -> Result<TokenTransferAccounts, SolError> {
    let source = sender.first().ok_or_else(|| {
        SolError::TokenAccountUnavailable(format!("sender has no account for {mint}"))
    })?;
    let program = TokenProgram::from_owner(&source.program)?;
    let recipient = recipient
        .iter()
        .find(|account| account.program == source.program)
        .map(|account| account.address.clone());

    Ok(TokenTransferAccounts {
        sender: source.address.clone(),
        recipient,
        program,
        decimals: source.decimals,
    })
}

#[derive(Debug, Clone)]
pub struct SolanaPreloader {
    client: SolanaClient,
    fees: SolanaFeeCalculator,
    chain: Chain,
}

impl SolanaPreloader {
    pub fn new(client: SolanaClient, chain: Chain) -> Self {
        Self {
            fees: SolanaFeeCalculator::new(client.clone(), chain),
            client,
            chain,
        }
    }

    /// Fetches the blockhash, unit price and, for token transfers, both
    /// token accounts concurrently.
    #[instrument(skip_all, fields(chain = %self.chain))]
    pub async fn preload(&self, intent: &Intent) -> Result<SolanaSignData, SolError> {
        check_supported(intent)?;

        let data = match &intent.action {
            IntentAction::TokenTransfer => self.preload_token_transfer(intent).await?,
            _ => {
                let (blockhash, fees) = futures_util::try_join!(
                    self.client.latest_blockhash(),
                    self.fees.calculate(intent, false),
                )?;
                SolanaSignData {
                    blockhash,
                    sender_token_address: None,
                    recipient_token_address: None,
                    token_program: TokenProgram::default(),
                    decimals: 0,
                    fees,
                }
            }
        };
        info!(blockhash = %data.blockhash, "preloaded");
        Ok(data)
    }

    async fn preload_token_transfer(&self, intent: &Intent) -> Result<SolanaSignData, SolError> {
        let mint = intent.asset.token_id.as_deref().ok_or_else(|| {
            SolError::TransactionBuildError("token transfer without mint".into())
        })?;
        let recipient = intent.require_destination()?;

        let accounts_and_fees = async {
            let (sender_accounts, recipient_accounts) = futures_util::try_join!(
                self.client.token_accounts(&intent.from.address, mint),
                self.client.token_accounts(recipient, mint),
            )?;
            let accounts = token_transfer_accounts(mint, &sender_accounts, &recipient_accounts)?;
            let fees = self
                .fees
                .calculate(intent, accounts.recipient.is_none())
                .await?;
            Ok::<_, SolError>((accounts, fees))
        };
        let (blockhash, (accounts, fees)) =
            futures_util::try_join!(self.client.latest_blockhash(), accounts_and_fees)?;

        Ok(SolanaSignData {
            blockhash,
            sender_token_address: Some(accounts.sender),
            recipient_token_address: accounts.recipient,
            token_program: accounts.program,
            decimals: accounts.decimals,
            fees,
        })
    }
}

/// Intents with no Solana counterpart fail before any request is made.
pub fn check_supported(intent: &Intent) -> Result<(), SolError> {
    let unsupported = match &intent.action {
        IntentAction::NativeTransfer
        | IntentAction::TokenTransfer
        | IntentAction::GenericTransfer { .. }
        | IntentAction::Swap(_) => return Ok(()),
        IntentAction::Stake(action) => match action {
            StakeAction::Delegate { .. }
            | StakeAction::Undelegate { .. }
            | StakeAction::Withdraw { .. } => return Ok(()),
            StakeAction::Redelegate { .. } => "redelegate",
            StakeAction::ClaimRewards { .. } => "claim rewards",
        },
        IntentAction::TokenApproval(_) => "token approval",
        IntentAction::NftTransfer(_) => "nft transfer",
        IntentAction::AccountActivation => "account activation",
    };
    Err(SolError::UnsupportedOperation(format!("{unsupported} on Solana")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use chain_rpc::mock::MockTransport;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wallet_types::{Account, ApprovalData, TOKEN_ACCOUNT_CREATION};

    const OWNER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const RECIPIENT: &str = "3emsAVdmGKERbHjmGfQ6oZ1e35dkf5iYcS6U4CPKFVaa";
    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
    const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";
    const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

    fn from() -> Account {
        Account::new(Chain::Solana, OWNER)
    }

    fn token_account(address: &str, program: &str) -> Value {
        json!({
            "pubkey": address,
            "account": {
                "owner": program,
                "data": {"parsed": {"type": "account", "info": {
                    "mint": MINT,
                    "tokenAmount": {"amount": "1000000", "decimals": 6}
                }}}
            }
        })
    }

    fn base_mock() -> MockTransport {
        MockTransport::new()
            .with(
                "getLatestBlockhash",
                json!({"context": {"slot": 1}, "value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 10}}),
            )
            .with("getRecentPrioritizationFees", json!([]))
            .with("getMinimumBalanceForRentExemption", json!(2_039_280u64))
    }

    fn preloader(mock: MockTransport) -> (Arc<MockTransport>, SolanaPreloader) {
        let mock = Arc::new(mock);
        let client = SolanaClient::new(mock.clone());
        (mock, SolanaPreloader::new(client, Chain::Solana))
    }

    #[tokio::test]
    async fn native_transfer_fetches_blockhash_and_fee() {
        let (mock, preloader) = preloader(base_mock());
        let intent = Intent::native_transfer(from(), RECIPIENT, U256::from(1_000_000));

        let data = preloader.preload(&intent).await.unwrap();

        assert_eq!(data.blockhash, BLOCKHASH);
        assert_eq!(data.fees.len(), 3);
        assert_eq!(data.fee(FeePriority::Fast).unwrap().amount, U256::from(6_000));
        assert_eq!(data.sender_token_address, None);
        assert_eq!(mock.call_count("getTokenAccountsByOwner"), 0);
    }

    #[tokio::test]
    async fn token_transfer_with_recipient_account_has_no_rent() {
        let mock = base_mock()
            .with_matching(
                "getTokenAccountsByOwner",
                OWNER,
                json!({"context": {}, "value": [token_account("senderAta", TOKEN_PROGRAM)]}),
            )
            .with_matching(
                "getTokenAccountsByOwner",
                RECIPIENT,
                json!({"context": {}, "value": [token_account("recipientAta", TOKEN_PROGRAM)]}),
            );
        let (mock, preloader) = preloader(mock);
        let intent = Intent::token_transfer(from(), MINT, RECIPIENT, U256::from(500));

        let data = preloader.preload(&intent).await.unwrap();

        assert_eq!(data.sender_token_address.as_deref(), Some("senderAta"));
        assert_eq!(data.recipient_token_address.as_deref(), Some("recipientAta"));
        assert_eq!(data.token_program, TokenProgram::Token);
        assert_eq!(data.decimals, 6);
        // token floor price: 5000 + 100_000 * 100_000 / 1e6
        assert_eq!(data.fees[0].amount, U256::from(15_000));
        assert!(data.fees[0].options.is_empty());
        assert_eq!(mock.call_count("getMinimumBalanceForRentExemption"), 0);
    }

    #[tokio::test]
    async fn missing_recipient_account_adds_rent() {
        let mock = base_mock()
            .with_matching(
                "getTokenAccountsByOwner",
                OWNER,
                json!({"context": {}, "value": [token_account("senderAta", TOKEN_PROGRAM)]}),
            )
            .with_matching(
                "getTokenAccountsByOwner",
                RECIPIENT,
                json!({"context": {}, "value": []}),
            );
        let (_, preloader) = preloader(mock);
        let intent = Intent::token_transfer(from(), MINT, RECIPIENT, U256::from(500));

        let data = preloader.preload(&intent).await.unwrap();

        assert_eq!(data.recipient_token_address, None);
        let quote = data.fee(FeePriority::Normal).unwrap();
        assert_eq!(quote.amount, U256::from(15_000 + 2_039_280));
        assert_eq!(quote.options[TOKEN_ACCOUNT_CREATION], U256::from(2_039_280));
    }

    #[tokio::test]
    async fn sender_without_token_account_fails() {
        let mock = base_mock().with(
            "getTokenAccountsByOwner",
            json!({"context": {}, "value": []}),
        );
        let (_, preloader) = preloader(mock);
        let intent = Intent::token_transfer(from(), MINT, RECIPIENT, U256::from(500));

        let err = preloader.preload(&intent).await.unwrap_err();
        assert!(matches!(err, SolError::TokenAccountUnavailable(_)));
    }

    #[tokio::test]
    async fn preload_is_idempotent() {
        let (_, preloader) = preloader(base_mock());
        let intent = Intent::native_transfer(from(), RECIPIENT, U256::from(1_000_000));
        assert_eq!(
            preloader.preload(&intent).await.unwrap(),
            preloader.preload(&intent).await.unwrap()
        );
    }

    #[tokio::test]
    async fn unsupported_intents_fail_without_requests() {
        let (mock, preloader) = preloader(base_mock());
        let intent = Intent::approval(
            from(),
            ApprovalData {
                token: MINT.into(),
                spender: RECIPIENT.into(),
            },
        );

        let err = preloader.preload(&intent).await.unwrap_err();

        assert!(matches!(err, SolError::UnsupportedOperation(_)));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn recipient_under_other_program_is_not_reused() {
        let sender = vec![TokenAccount {
            address: "senderAta".into(),
            program: TOKEN_PROGRAM.into(),
            mint: MINT.into(),
            amount: 1,
            decimals: 9,
        }];
        let recipient = vec![TokenAccount {
            address: "other".into(),
            program: "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb".into(),
            mint: MINT.into(),
            amount: 0,
            decimals: 9,
        }];
        let accounts = token_transfer_accounts(MINT, &sender, &recipient).unwrap();
        assert_eq!(accounts.recipient, None);
        assert_eq!(accounts.decimals, 9);
    }
}
