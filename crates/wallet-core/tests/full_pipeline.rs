//! Cross-crate tests of the whole pipeline: preload -> sign -> broadcast ->
//! status, against canned node and gateway responses.

use std::sync::Arc;

use chain_rpc::mock::MockTransport;
use chain_rpc::RpcError;
use chain_sol::address::address_from_private_key;
use crypto_utils::PrivateKey;
use serde_json::json;
use wallet_core::gateway::GatewayFee;
use wallet_core::{
    ChainSignData, ErrorKind, MockGateway, PipelineConfig, TransactionPipeline, WalletError,
};
use wallet_types::{
    Account, Chain, FeePriority, FeeShape, Intent, TransactionState, TransactionStatus, U256,
};

const ETH_FROM: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
const ETH_TO: &str = "0x000000000000000000000000000000000000dEaD";
const SOL_TO: &str = "3emsAVdmGKERbHjmGfQ6oZ1e35dkf5iYcS6U4CPKFVaa";
const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";
const ONE_ETH: u128 = 1_000_000_000_000_000_000;

fn eth_key() -> PrivateKey {
    let mut bytes = [0u8; 32];
    bytes[31] = 1;
    PrivateKey::new(bytes)
}

fn eth_node() -> Arc<MockTransport> {
    Arc::new(
        MockTransport::new()
            .with("eth_getTransactionCount", json!("0x7"))
            .with("eth_estimateGas", json!("0x5208"))
            .with(
                "eth_feeHistory",
                json!({"baseFeePerGas": ["0xa", "0x8"], "reward": [["0xa", "0xa", "0xa"]]}),
            ),
    )
}

fn pipeline(gateway: MockGateway) -> TransactionPipeline {
    let config =
        PipelineConfig::from_json(r#"{"evm_fees": {"ethereum": {"min_priority_fee": 1}}}"#)
            .unwrap();
    TransactionPipeline::new(config, Arc::new(gateway)).unwrap()
}

// ─── EVM ───────────────────────────────────────────────────────────

#[tokio::test]
async fn eth_native_transfer_end_to_end() {
    let node = Arc::new(
        MockTransport::new()
            .with("eth_getTransactionCount", json!("0x7"))
            .with("eth_estimateGas", json!("0x5208"))
            .with(
                "eth_feeHistory",
                json!({"baseFeePerGas": ["0xa", "0x8"], "reward": [["0xa", "0xa", "0xa"]]}),
            )
            .with("eth_sendRawTransaction", json!("0xfeed"))
            .with(
                "eth_getTransactionReceipt",
                json!({"status": "0x1", "gasUsed": "0xa", "effectiveGasPrice": "0x2", "l1Fee": "0x1"}),
            ),
    );
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Ethereum, node.clone());
    let intent = Intent::native_transfer(
        Account::new(Chain::Ethereum, ETH_FROM),
        ETH_TO,
        U256::from(ONE_ETH),
    );

    // 1. Preload: base fee 10, priority fee 10, 21000 gas kept as is.
    let params = pipeline.preload(&intent).await.unwrap();
    let quote = params.data.fee(FeePriority::Normal).unwrap();
    assert_eq!(quote.amount, U256::from(420_000));
    assert_eq!(
        quote.shape,
        FeeShape::Eip1559 {
            gas_limit: U256::from(21_000),
            max_fee_per_gas: U256::from(20),
            max_priority_fee_per_gas: U256::from(10),
        }
    );
    assert_eq!(params.data.fees().len(), 3);

    // 2. Sign
    let signed = pipeline
        .sign(&params, FeePriority::Normal, &eth_key())
        .unwrap();
    assert_eq!(signed.len(), 1);
    assert_eq!(signed[0][0], 0x02);

    // 3. Broadcast
    let hash = pipeline.broadcast(Chain::Ethereum, &signed).await.unwrap();
    assert_eq!(hash, "0xfeed");
    assert_eq!(node.call_count("eth_sendRawTransaction"), 1);

    // 4. Status: 10 gas at price 2 plus an L1 fee of 1
    let status = pipeline.transaction_status(Chain::Ethereum, &hash).await;
    assert_eq!(status.state, TransactionState::Confirmed);
    assert_eq!(status.fee, Some(U256::from(21)));
}

#[tokio::test]
async fn eth_send_max_spends_exactly_the_balance() {
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Ethereum, eth_node());
    let intent = Intent::native_transfer(
        Account::new(Chain::Ethereum, ETH_FROM),
        ETH_TO,
        U256::from(ONE_ETH),
    )
    .with_max(true);

    let params = pipeline.preload(&intent).await.unwrap();

    for priority in FeePriority::ALL {
        let fee = params.data.fee(priority).unwrap().amount;
        let sent = params.final_amount(priority).unwrap();
        assert_eq!(sent + fee, U256::from(ONE_ETH));
    }
    match params.data.fee(FeePriority::Normal).unwrap().shape {
        FeeShape::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
            ..
        } => assert_eq!(max_fee_per_gas, max_priority_fee_per_gas),
        ref other => panic!("unexpected shape {other:?}"),
    }
}

#[tokio::test]
async fn eth_preload_is_idempotent() {
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Ethereum, eth_node());
    let intent = Intent::native_transfer(
        Account::new(Chain::Ethereum, ETH_FROM),
        ETH_TO,
        U256::from(5),
    );

    let first = pipeline.preload(&intent).await.unwrap();
    let second = pipeline.preload(&intent).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_fee_history_is_data_unavailable() {
    let node = Arc::new(
        MockTransport::new()
            .with("eth_getTransactionCount", json!("0x7"))
            .with("eth_estimateGas", json!("0x5208"))
            .with("eth_feeHistory", serde_json::Value::Null),
    );
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Ethereum, node);
    let intent = Intent::native_transfer(
        Account::new(Chain::Ethereum, ETH_FROM),
        ETH_TO,
        U256::from(5),
    );

    let err = pipeline.preload(&intent).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn node_timeout_during_preload_is_retryable() {
    let node = Arc::new(
        MockTransport::new()
            .with("eth_getTransactionCount", json!("0x7"))
            .with_error("eth_estimateGas", RpcError::Timeout)
            .with_error("eth_feeHistory", RpcError::Timeout),
    );
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Ethereum, node);
    let intent = Intent::native_transfer(
        Account::new(Chain::Ethereum, ETH_FROM),
        ETH_TO,
        U256::from(5),
    );

    let err = pipeline.preload(&intent).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn evm_data_cannot_sign_solana_intent() {
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Ethereum, eth_node());
    let eth_intent = Intent::native_transfer(
        Account::new(Chain::Ethereum, ETH_FROM),
        ETH_TO,
        U256::from(5),
    );
    let mut params = pipeline.preload(&eth_intent).await.unwrap();
    params.intent = Intent::native_transfer(Account::new(Chain::Solana, SOL_TO), SOL_TO, U256::from(5));

    let err = pipeline
        .sign(&params, FeePriority::Normal, &eth_key())
        .unwrap_err();
    assert!(matches!(err, WalletError::ChainDataMismatch(_)));
}

// ─── Solana ────────────────────────────────────────────────────────

#[tokio::test]
async fn sol_native_transfer_end_to_end() {
    let seed = [7u8; 32];
    let key = PrivateKey::new(seed);
    let owner = address_from_private_key(&seed);
    let node = Arc::new(
        MockTransport::new()
            .with(
                "getLatestBlockhash",
                json!({"context": {"slot": 1}, "value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 10}}),
            )
            .with("getRecentPrioritizationFees", json!([]))
            .with("sendTransaction", json!("sig1"))
            .with("getTransaction", json!({"meta": {"err": null, "fee": 6000}})),
    );
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Solana, node.clone());
    let intent = Intent::native_transfer(
        Account::new(Chain::Solana, owner),
        SOL_TO,
        U256::from(1_000_000),
    );

    let params = pipeline.preload(&intent).await.unwrap();
    assert!(matches!(params.data, ChainSignData::Solana(_)));
    // 5000 per signature + 10_000 µlamports * 100_000 units
    let fees: Vec<_> = params.data.fees().iter().map(|q| q.amount).collect();
    assert_eq!(fees, vec![U256::from(6_000); 3]);

    let signed = pipeline.sign(&params, FeePriority::Fast, &key).unwrap();
    assert_eq!(signed.len(), 1);
    assert_eq!(signed[0][0], 1, "one signature");

    let signature = pipeline.broadcast(Chain::Solana, &signed).await.unwrap();
    assert_eq!(signature, "sig1");

    let status = pipeline.transaction_status(Chain::Solana, &signature).await;
    assert_eq!(
        status,
        TransactionStatus::terminal(TransactionState::Confirmed, Some(U256::from(6_000)))
    );
}

#[tokio::test]
async fn sol_signing_with_wrong_key_fails() {
    let node = Arc::new(
        MockTransport::new()
            .with(
                "getLatestBlockhash",
                json!({"context": {"slot": 1}, "value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 10}}),
            )
            .with("getRecentPrioritizationFees", json!([])),
    );
    let pipeline = pipeline(MockGateway::new()).with_transport(Chain::Solana, node);
    let intent = Intent::native_transfer(
        Account::new(Chain::Solana, address_from_private_key(&[7u8; 32])),
        SOL_TO,
        U256::from(1_000_000),
    );

    let params = pipeline.preload(&intent).await.unwrap();
    let err = pipeline
        .sign(&params, FeePriority::Normal, &PrivateKey::new([8u8; 32]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Signing);
}

// ─── Gateway ───────────────────────────────────────────────────────

#[tokio::test]
async fn gateway_chain_preload_broadcast_status() {
    let fee = GatewayFee {
        fee: U256::from(5_000),
        gas_price: U256::from(1),
        gas_limit: U256::from(5_000),
        ..GatewayFee::default()
    };
    let gateway = MockGateway::new()
        .with_preload(json!({"account_number": 1, "sequence": 9}))
        .with_rate("normal", 1)
        .with_load("normal", fee)
        .with_hash("C0FFEE")
        .with_status(TransactionStatus::terminal(
            TransactionState::Failed,
            Some(U256::from(5_000)),
        ));
    let pipeline = pipeline(gateway);
    let intent = Intent::native_transfer(
        Account::new(Chain::Osmosis, "osmo1sender"),
        "osmo1dest",
        U256::from(1_000_000),
    );

    let params = pipeline.preload(&intent).await.unwrap();
    let ChainSignData::Gateway(data) = &params.data else {
        panic!("expected gateway data");
    };
    assert_eq!(data.fees.len(), 3);
    assert!(data.fees.iter().all(|q| q.amount == U256::from(5_000)));

    // Keys never leave the process, so the gateway cannot sign.
    let err = pipeline
        .sign(&params, FeePriority::Normal, &eth_key())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    let hash = pipeline.broadcast(Chain::Osmosis, &[vec![1, 2, 3]]).await.unwrap();
    assert_eq!(hash, "C0FFEE");
    let status = pipeline.transaction_status(Chain::Osmosis, &hash).await;
    assert_eq!(status.state, TransactionState::Failed);
}
