//! Shared gateway for chains without a native implementation.
//!
//! The gateway speaks in chain ids (`Chain::as_str`) and loosely typed
//! metadata; [`crate::dispatch`] turns its answers into typed quotes and
//! sign data.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chain_rpc::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wallet_types::{Delegation, DelegationValidator, Intent, IntentAction, TransactionStatus, U256};

/// What the gateway needs to know about an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransactionInput {
    pub action: IntentAction,
    pub sender_address: String,
    pub destination_address: Option<String>,
    pub token_id: Option<String>,
    pub value: U256,
    pub memo: Option<String>,
    pub is_max_value: bool,
}

impl From<&Intent> for GatewayTransactionInput {
    fn from(intent: &Intent) -> Self {
        Self {
            action: intent.action.clone(),
            sender_address: intent.from.address.clone(),
            destination_address: intent.destination.clone(),
            token_id: intent.asset.token_id.clone(),
            value: intent.amount,
            memo: intent.memo.clone(),
            is_max_value: intent.use_max,
        }
    }
}

/// Opaque chain state (sequence, block refs, UTXOs...) from `transaction_preload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPreload {
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayFeeRate {
    /// `"slow"`, `"normal"` or `"fast"`. Unknown ranks are ignored.
    pub priority: String,
    pub gas_price: U256,
    pub priority_fee: Option<U256>,
}

/// Input of one `transaction_load` call: the intent priced at one rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayLoadInput {
    pub input: GatewayTransactionInput,
    pub rate: GatewayFeeRate,
    pub metadata: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayFee {
    /// Total fee, options included.
    pub fee: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub options: BTreeMap<String, U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransactionLoad {
    pub fee: GatewayFee,
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    /// The address is controlled by a multi-signature scheme.
    MultiSignature,
}

/// Remote preload, fee, broadcast and status service.
#[async_trait]
pub trait Gateway: Send + Sync + fmt::Debug {
    async fn transaction_preload(
        &self,
        chain: &str,
        input: &GatewayTransactionInput,
    ) -> Result<GatewayPreload, RpcError>;

    async fn fee_rates(
        &self,
        chain: &str,
        input: &GatewayTransactionInput,
    ) -> Result<Vec<GatewayFeeRate>, RpcError>;

    async fn transaction_load(
        &self,
        chain: &str,
        input: &GatewayLoadInput,
    ) -> Result<GatewayTransactionLoad, RpcError>;

    /// Submits signed transactions in order; returns the last hash.
    async fn broadcast(&self, chain: &str, raw_txs: &[Vec<u8>]) -> Result<String, RpcError>;

    async fn transaction_status(
        &self,
        chain: &str,
        hash: &str,
    ) -> Result<TransactionStatus, RpcError>;

    async fn staking_validators(&self, chain: &str)
        -> Result<Vec<DelegationValidator>, RpcError>;

    async fn staking_delegations(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Vec<Delegation>, RpcError>;

    async fn address_status(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Vec<AddressStatus>, RpcError>;
}

#[cfg(any(test, feature = "mock"))]
pub use mock::MockGateway;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    struct State {
        preload: Option<GatewayPreload>,
        rates: Vec<GatewayFeeRate>,
        loads: BTreeMap<String, GatewayFee>,
        hash: Option<String>,
        status: Option<TransactionStatus>,
        validators: Vec<DelegationValidator>,
        delegations: Vec<Delegation>,
        address_status: Vec<AddressStatus>,
        failing: Option<(String, RpcError)>,
    }

    /// Canned gateway. Fees are keyed by rate priority; unset answers are
    /// empty results. Every call is recorded as `(method, chain)`.
    #[derive(Debug, Default)]
    pub struct MockGateway {
        state: Mutex<State>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_preload(self, metadata: Value) -> Self {
            self.state().preload = Some(GatewayPreload { metadata });
            self
        }

        pub fn with_rate(self, priority: &str, gas_price: u64) -> Self {
            self.state().rates.push(GatewayFeeRate {
                priority: priority.to_string(),
                gas_price: U256::from(gas_price),
                priority_fee: None,
            });
            self
        }

        pub fn with_load(self, priority: &str, fee: GatewayFee) -> Self {
            self.state().loads.insert(priority.to_string(), fee);
            self
        }

        pub fn with_hash(self, hash: &str) -> Self {
            self.state().hash = Some(hash.to_string());
            self
        }

        pub fn with_status(self, status: TransactionStatus) -> Self {
            self.state().status = Some(status);
            self
        }

        pub fn with_validators(self, validators: Vec<DelegationValidator>) -> Self {
            self.state().validators = validators;
            self
        }

        pub fn with_delegations(self, delegations: Vec<Delegation>) -> Self {
            self.state().delegations = delegations;
            self
        }

        pub fn with_address_status(self, status: Vec<AddressStatus>) -> Self {
            self.state().address_status = status;
            self
        }

        /// Fail every call to `method`.
        pub fn with_error(self, method: &str, error: RpcError) -> Self {
            self.state().failing = Some((method.to_string(), error));
            self
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        pub fn call_count(&self, method: &str) -> usize {
            self.calls().iter().filter(|(m, _)| m == method).count()
        }

        fn state(&self) -> std::sync::MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        fn record(&self, method: &str, chain: &str) -> Result<(), RpcError> {
            self.calls
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((method.to_string(), chain.to_string()));
            match &self.state().failing {
                Some((failing, error)) if failing == method => Err(error.clone()),
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl Gateway for MockGateway {
        async fn transaction_preload(
            &self,
            chain: &str,
            _input: &GatewayTransactionInput,
        ) -> Result<GatewayPreload, RpcError> {
            self.record("transaction_preload", chain)?;
            self.state()
                .preload
                .clone()
                .ok_or_else(|| RpcError::EmptyResult("transaction_preload".into()))
        }

        async fn fee_rates(
            &self,
            chain: &str,
            _input: &GatewayTransactionInput,
        ) -> Result<Vec<GatewayFeeRate>, RpcError> {
            self.record("fee_rates", chain)?;
            Ok(self.state().rates.clone())
        }

        async fn transaction_load(
            &self,
            chain: &str,
            input: &GatewayLoadInput,
        ) -> Result<GatewayTransactionLoad, RpcError> {
            self.record("transaction_load", chain)?;
            let fee = self
                .state()
                .loads
                .get(&input.rate.priority)
                .cloned()
                .ok_or_else(|| RpcError::EmptyResult("transaction_load".into()))?;
            Ok(GatewayTransactionLoad {
                fee,
                metadata: input.metadata.clone(),
            })
        }

        async fn broadcast(&self, chain: &str, _raw_txs: &[Vec<u8>]) -> Result<String, RpcError> {
            self.record("broadcast", chain)?;
            self.state()
                .hash
                .clone()
                .ok_or_else(|| RpcError::EmptyResult("broadcast".into()))
        }

        async fn transaction_status(
            &self,
            chain: &str,
            _hash: &str,
        ) -> Result<TransactionStatus, RpcError> {
            self.record("transaction_status", chain)?;
            self.state()
                .status
                .clone()
                .ok_or_else(|| RpcError::EmptyResult("transaction_status".into()))
        }

        async fn staking_validators(
            &self,
            chain: &str,
        ) -> Result<Vec<DelegationValidator>, RpcError> {
            self.record("staking_validators", chain)?;
            Ok(self.state().validators.clone())
        }

        async fn staking_delegations(
            &self,
            chain: &str,
            _address: &str,
        ) -> Result<Vec<Delegation>, RpcError> {
            self.record("staking_delegations", chain)?;
            Ok(self.state().delegations.clone())
        }

        async fn address_status(
            &self,
            chain: &str,
            _address: &str,
        ) -> Result<Vec<AddressStatus>, RpcError> {
            self.record("address_status", chain)?;
            Ok(self.state().address_status.clone())
        }
    }
}
