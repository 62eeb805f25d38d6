use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_rpc::{RpcClient, RpcError, RpcTransport};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::debug;
use wallet_types::NodeStatus;

use crate::address::bytes_to_address;
use crate::error::SolError;
use crate::stake::STAKE_PROGRAM_ID;

/// Offset of the withdraw authority inside a stake account.
const STAKE_WITHDRAWER_OFFSET: u64 = 44;

/// Most RPC results are wrapped as `{ context, value }`.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
    #[serde(default)]
    prioritization_fee: u64,
}

/// A token account from `getTokenAccountsByOwner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccount {
    pub address: String,
    /// Owning program, Token or Token-2022.
    pub program: String,
    pub mint: String,
    pub amount: u64,
    pub decimals: u8,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount<T> {
    pubkey: String,
    account: T,
}

#[derive(Debug, Deserialize)]
struct ParsedTokenAccount {
    owner: String,
    data: ParsedData<TokenAccountInfo>,
}

#[derive(Debug, Deserialize)]
struct ParsedData<T> {
    parsed: Parsed<T>,
}

#[derive(Debug, Deserialize)]
struct Parsed<T> {
    #[serde(default, rename = "type")]
    kind: String,
    info: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    #[serde(deserialize_with = "u64_from_string")]
    amount: u64,
    decimals: u8,
}

/// `getTransaction` fields the status client reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionResult {
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMeta {
    /// `null` on success.
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoteAccounts {
    #[serde(default)]
    pub current: Vec<VoteAccount>,
    #[serde(default)]
    pub delinquent: Vec<VoteAccount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAccount {
    pub vote_pubkey: String,
    pub node_pubkey: String,
    #[serde(default)]
    pub commission: u8,
    #[serde(default)]
    pub activated_stake: u64,
    #[serde(default)]
    pub epoch_vote_account: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch: u64,
    #[serde(default)]
    pub slot_index: u64,
    #[serde(default)]
    pub slots_in_epoch: u64,
}

/// A stake account owned by a wallet, from `getProgramAccounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeAccount {
    pub address: String,
    pub lamports: u64,
    /// `None` until the account is delegated.
    pub delegation: Option<StakeDelegation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDelegation {
    pub voter: String,
    #[serde(deserialize_with = "u64_from_string")]
    pub stake: u64,
    #[serde(deserialize_with = "u64_from_string")]
    pub activation_epoch: u64,
    /// `u64::MAX` while the stake is not deactivating.
    #[serde(deserialize_with = "u64_from_string")]
    pub deactivation_epoch: u64,
}

#[derive(Debug, Deserialize)]
struct RawStakeAccount {
    lamports: u64,
    data: ParsedData<StakeAccountInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct StakeAccountInfo {
    #[serde(default)]
    stake: Option<StakeInfo>,
}

#[derive(Debug, Deserialize)]
struct StakeInfo {
    delegation: StakeDelegation,
}

/// Parsed account data prints 64-bit integers as strings.
fn u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("not a u64: {n}"))),
        other => Err(serde::de::Error::custom(format!("not a u64: {other}"))),
    }
}

/// Typed Solana JSON-RPC calls over a shared transport.
#[derive(Debug, Clone)]
pub struct SolanaClient {
    rpc: RpcClient,
}

impl SolanaClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            rpc: RpcClient::new(transport),
        }
    }

    /// Lamports held by `address`.
    pub async fn balance(&self, address: &str) -> Result<u64, SolError> {
        let result: WithContext<u64> = self
            .rpc
            .call_required("getBalance", json!([address]))
            .await?;
        Ok(result.value)
    }

    /// Accounts of `owner` holding `mint`, under either token program.
    pub async fn token_accounts(&self, owner: &str, mint: &str) -> Result<Vec<TokenAccount>, SolError> {
        let result: WithContext<Vec<KeyedAccount<ParsedTokenAccount>>> = self
            .rpc
            .call_required(
                "getTokenAccountsByOwner",
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed" }]),
            )
            .await?;
        Ok(result
            .value
            .into_iter()
            .map(|keyed| {
                let info = keyed.account.data.parsed.info;
                TokenAccount {
                    address: keyed.pubkey,
                    program: keyed.account.owner,
                    mint: info.mint,
                    amount: info.token_amount.amount,
                    decimals: info.token_amount.decimals,
                }
            })
            .collect())
    }

    pub async fn rent_exemption(&self, size: u64) -> Result<u64, SolError> {
        Ok(self
            .rpc
            .call_required("getMinimumBalanceForRentExemption", json!([size]))
            .await?)
    }

    /// Recently paid prioritization fees, in micro-lamports per compute unit.
    pub async fn prioritization_fees(&self) -> Result<Vec<u64>, SolError> {
        let fees: Option<Vec<PrioritizationFee>> = self
            .rpc
            .call("getRecentPrioritizationFees", json!([]))
            .await?;
        Ok(fees
            .unwrap_or_default()
            .into_iter()
            .map(|fee| fee.prioritization_fee)
            .collect())
    }

    /// Base58 blockhash. Never cached: each preload asks again.
    pub async fn latest_blockhash(&self) -> Result<String, SolError> {
        let result: Option<WithContext<LatestBlockhash>> = self
            .rpc
            .call("getLatestBlockhash", json!([{ "commitment": "finalized" }]))
            .await
            .map_err(SolError::BlockhashUnavailable)?;
        result
            .map(|r| r.value.blockhash)
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| {
                SolError::BlockhashUnavailable(RpcError::EmptyResult("getLatestBlockhash".into()))
            })
    }

    /// Submits wire bytes and returns the transaction signature.
    pub async fn send_transaction(&self, raw_tx: &[u8]) -> Result<String, SolError> {
        let signature: String = self
            .rpc
            .call_required(
                "sendTransaction",
                json!([BASE64.encode(raw_tx), { "encoding": "base64" }]),
            )
            .await?;
        debug!(%signature, "transaction submitted");
        Ok(signature)
    }

    /// `None` while the cluster does not know the signature.
    pub async fn transaction(&self, signature: &str) -> Result<Option<TransactionResult>, SolError> {
        Ok(self
            .rpc
            .call(
                "getTransaction",
                json!([signature, {
                    "encoding": "json",
                    "maxSupportedTransactionVersion": 0,
                }]),
            )
            .await?)
    }

    pub async fn vote_accounts(&self) -> Result<VoteAccounts, SolError> {
        Ok(self.rpc.call_required("getVoteAccounts", json!([])).await?)
    }

    /// Stake accounts whose withdraw authority is `owner`.
    pub async fn stake_accounts(&self, owner: &str) -> Result<Vec<StakeAccount>, SolError> {
        let accounts: Option<Vec<KeyedAccount<RawStakeAccount>>> = self
            .rpc
            .call(
                "getProgramAccounts",
                json!([
                    bytes_to_address(&STAKE_PROGRAM_ID),
                    {
                        "encoding": "jsonParsed",
                        "filters": [{
                            "memcmp": { "offset": STAKE_WITHDRAWER_OFFSET, "bytes": owner }
                        }],
                    }
                ]),
            )
            .await?;
        Ok(accounts
            .unwrap_or_default()
            .into_iter()
            .map(|keyed| StakeAccount {
                address: keyed.pubkey,
                lamports: keyed.account.lamports,
                delegation: match keyed.account.data.parsed.kind.as_str() {
                    "delegated" => keyed.account.data.parsed.info.stake.map(|s| s.delegation),
                    _ => None,
                },
            })
            .collect())
    }

    pub async fn epoch_info(&self) -> Result<EpochInfo, SolError> {
        Ok(self.rpc.call_required("getEpochInfo", json!([])).await?)
    }

    pub async fn genesis_hash(&self) -> Result<String, SolError> {
        Ok(self.rpc.call_required("getGenesisHash", json!([])).await?)
    }

    pub async fn slot(&self) -> Result<u64, SolError> {
        Ok(self.rpc.call_required("getSlot", json!([])).await?)
    }

    /// `getHealth` answers `"ok"`, or an RPC error when the node lags.
    pub async fn is_healthy(&self) -> Result<bool, SolError> {
        match self.rpc.call::<String>("getHealth", json!([])).await {
            Ok(health) => Ok(health == "ok"),
            Err(RpcError::Rpc { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Genesis hash, slot and health. Each field is `None` when its own call
    /// fails.
    pub async fn node_status(&self) -> NodeStatus {
        let (genesis, slot, healthy) =
            futures_util::join!(self.genesis_hash(), self.slot(), self.is_healthy());
        NodeStatus {
            chain_id: genesis.ok(),
            latest_block: slot.ok(),
            is_synced: healthy.ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_rpc::mock::MockTransport;

    const OWNER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn client(mock: MockTransport) -> (Arc<MockTransport>, SolanaClient) {
        let mock = Arc::new(mock);
        (mock.clone(), SolanaClient::new(mock))
    }

    #[tokio::test]
    async fn balance_unwraps_context() {
        let (_, client) = client(MockTransport::new().with(
            "getBalance",
            json!({"context": {"slot": 1}, "value": 2_500_000_000u64}),
        ));
        assert_eq!(client.balance(OWNER).await.unwrap(), 2_500_000_000);
    }

    #[tokio::test]
    async fn token_accounts_read_parsed_fields() {
        let (mock, client) = client(MockTransport::new().with(
            "getTokenAccountsByOwner",
            json!({
                "context": {"slot": 1},
                "value": [{
                    "pubkey": "3emsAVdmGKERbHjmGfQ6oZ1e35dkf5iYcS6U4CPKFVaa",
                    "account": {
                        "owner": "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb",
                        "lamports": 2039280,
                        "data": {
                            "program": "spl-token-2022",
                            "parsed": {
                                "type": "account",
                                "info": {
                                    "mint": MINT,
                                    "owner": OWNER,
                                    "tokenAmount": {"amount": "1500000", "decimals": 6}
                                }
                            }
                        }
                    }
                }]
            }),
        ));

        let accounts = client.token_accounts(OWNER, MINT).await.unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].program, "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
        assert_eq!(accounts[0].amount, 1_500_000);
        assert_eq!(accounts[0].decimals, 6);
        let params = mock.params_of("getTokenAccountsByOwner").unwrap();
        assert_eq!(params[1]["mint"], MINT);
        assert_eq!(params[2]["encoding"], "jsonParsed");
    }

    #[tokio::test]
    async fn null_prioritization_fees_are_empty() {
        let (_, client) = client(MockTransport::new().with("getRecentPrioritizationFees", Value::Null));
        assert!(client.prioritization_fees().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blockhash_errors_are_distinct() {
        let (_, client) = client(MockTransport::new().with_error("getLatestBlockhash", RpcError::Timeout));
        assert!(matches!(
            client.latest_blockhash().await.unwrap_err(),
            SolError::BlockhashUnavailable(RpcError::Timeout)
        ));

        let (_, client) = self::client(MockTransport::new().with("getLatestBlockhash", Value::Null));
        assert!(matches!(
            client.latest_blockhash().await.unwrap_err(),
            SolError::BlockhashUnavailable(RpcError::EmptyResult(_))
        ));
    }

    #[tokio::test]
    async fn send_transaction_base64_encodes() {
        let (mock, client) = client(MockTransport::new().with("sendTransaction", json!("5sig")));
        assert_eq!(client.send_transaction(&[1, 2, 3]).await.unwrap(), "5sig");
        let params = mock.params_of("sendTransaction").unwrap();
        assert_eq!(params[0], "AQID");
        assert_eq!(params[1]["encoding"], "base64");
    }

    #[tokio::test]
    async fn stake_accounts_filter_by_withdrawer() {
        let (mock, client) = client(MockTransport::new().with(
            "getProgramAccounts",
            json!([
                {
                    "pubkey": "stakeA",
                    "account": {
                        "lamports": 5_002_282_880u64,
                        "data": {"parsed": {"type": "delegated", "info": {
                            "meta": {},
                            "stake": {"delegation": {
                                "voter": "voteA",
                                "stake": "5000000000",
                                "activationEpoch": "600",
                                "deactivationEpoch": "18446744073709551615"
                            }}
                        }}}
                    }
                },
                {
                    "pubkey": "stakeB",
                    "account": {
                        "lamports": 2_282_880,
                        "data": {"parsed": {"type": "initialized", "info": {"meta": {}}}}
                    }
                }
            ]),
        ));

        let accounts = client.stake_accounts(OWNER).await.unwrap();

        assert_eq!(accounts.len(), 2);
        let delegation = accounts[0].delegation.as_ref().unwrap();
        assert_eq!(delegation.voter, "voteA");
        assert_eq!(delegation.stake, 5_000_000_000);
        assert_eq!(delegation.deactivation_epoch, u64::MAX);
        assert_eq!(accounts[1].delegation, None);

        let params = mock.params_of("getProgramAccounts").unwrap();
        assert_eq!(params[0], "Stake11111111111111111111111111111111111111");
        assert_eq!(params[1]["filters"][0]["memcmp"]["offset"], 44);
        assert_eq!(params[1]["filters"][0]["memcmp"]["bytes"], OWNER);
    }

    #[tokio::test]
    async fn unhealthy_node_is_not_synced() {
        let (_, client) = client(
            MockTransport::new()
                .with("getGenesisHash", json!("5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d"))
                .with("getSlot", json!(250_000_000u64))
                .with_error(
                    "getHealth",
                    RpcError::Rpc {
                        code: -32005,
                        message: "Node is behind".into(),
                    },
                ),
        );

        let status = client.node_status().await;

        assert_eq!(
            status.chain_id.as_deref(),
            Some("5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d")
        );
        assert_eq!(status.latest_block, Some(250_000_000));
        assert_eq!(status.is_synced, Some(false));
    }

    #[tokio::test]
    async fn missing_slot_stays_unknown() {
        let (_, client) = client(MockTransport::new().with("getHealth", json!("ok")));
        let status = client.node_status().await;
        assert_eq!(status.latest_block, None);
        assert_eq!(status.chain_id, None);
        assert_eq!(status.is_synced, Some(true));
    }
}
