use serde::{Deserialize, Serialize};
use wallet_types::Chain;

/// Fee-market parameters for an EVM chain. Every field can be overridden
/// from the pipeline config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmFeeConfig {
    /// `eth_feeHistory` reward percentiles for Slow, Normal, Fast.
    pub reward_percentiles: [u64; 3],
    /// Priority fee floor in wei.
    pub min_priority_fee: u64,
    /// Number of blocks in the fee-history window.
    pub history_blocks: u64,
}

impl EvmFeeConfig {
    pub const fn new(min_priority_fee: u64) -> Self {
        Self {
            reward_percentiles: [20, 40, 60],
            min_priority_fee,
            history_blocks: 10,
        }
    }
}

/// Definition of an EVM-compatible blockchain network.
#[derive(Debug, Clone, Serialize)]
pub struct EvmChain {
    pub chain: Chain,
    pub chain_id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    /// Type-2 transactions. Legacy chains price with a single gas price.
    pub eip1559: bool,
    /// OP-stack rollup that charges an L1 data fee on top of execution gas.
    pub op_stack: bool,
    /// Native staking through the StakeHub system contract.
    pub stake_hub: bool,
    pub fee: EvmFeeConfig,
}

const GWEI: u64 = 1_000_000_000;

/// Ethereum Mainnet (chain ID 1).
pub const ETHEREUM: EvmChain = EvmChain {
    chain: Chain::Ethereum,
    chain_id: 1,
    name: "Ethereum",
    rpc_url: "https://eth.llamarpc.com",
    eip1559: true,
    op_stack: false,
    stake_hub: false,
    fee: EvmFeeConfig::new(GWEI),
};

/// BNB Smart Chain (chain ID 56).
pub const BSC: EvmChain = EvmChain {
    chain: Chain::SmartChain,
    chain_id: 56,
    name: "BNB Smart Chain",
    rpc_url: "https://bsc-dataseed.binance.org",
    eip1559: true,
    op_stack: false,
    stake_hub: true,
    fee: EvmFeeConfig::new(GWEI / 20),
};

/// Polygon PoS (chain ID 137).
pub const POLYGON: EvmChain = EvmChain {
    chain: Chain::Polygon,
    chain_id: 137,
    name: "Polygon",
    rpc_url: "https://polygon-rpc.com",
    eip1559: true,
    op_stack: false,
    stake_hub: false,
    fee: EvmFeeConfig::new(30 * GWEI),
};

/// Arbitrum One (chain ID 42161).
pub const ARBITRUM: EvmChain = EvmChain {
    chain: Chain::Arbitrum,
    chain_id: 42161,
    name: "Arbitrum One",
    rpc_url: "https://arb1.arbitrum.io/rpc",
    eip1559: true,
    op_stack: false,
    stake_hub: false,
    fee: EvmFeeConfig::new(10_000_000),
};

/// Base (chain ID 8453).
pub const BASE: EvmChain = EvmChain {
    chain: Chain::Base,
    chain_id: 8453,
    name: "Base",
    rpc_url: "https://mainnet.base.org",
    eip1559: true,
    op_stack: true,
    stake_hub: false,
    fee: EvmFeeConfig::new(100_000),
};

/// Optimism (chain ID 10).
pub const OPTIMISM: EvmChain = EvmChain {
    chain: Chain::Optimism,
    chain_id: 10,
    name: "Optimism",
    rpc_url: "https://mainnet.optimism.io",
    eip1559: true,
    op_stack: true,
    stake_hub: false,
    fee: EvmFeeConfig::new(10_000_000),
};

/// opBNB (chain ID 204).
pub const OPBNB: EvmChain = EvmChain {
    chain: Chain::OpBnb,
    chain_id: 204,
    name: "opBNB",
    rpc_url: "https://opbnb-mainnet-rpc.bnbchain.org",
    eip1559: true,
    op_stack: true,
    stake_hub: false,
    fee: EvmFeeConfig::new(1_000),
};

/// Avalanche C-Chain (chain ID 43114).
pub const AVALANCHE: EvmChain = EvmChain {
    chain: Chain::AvalancheC,
    chain_id: 43114,
    name: "Avalanche C-Chain",
    rpc_url: "https://api.avax.network/ext/bc/C/rpc",
    eip1559: true,
    op_stack: false,
    stake_hub: false,
    fee: EvmFeeConfig::new(GWEI),
};

/// Sepolia Testnet (chain ID 11155111).
pub const SEPOLIA: EvmChain = EvmChain {
    chain: Chain::Sepolia,
    chain_id: 11155111,
    name: "Sepolia",
    rpc_url: "https://rpc.sepolia.org",
    eip1559: true,
    op_stack: false,
    stake_hub: false,
    fee: EvmFeeConfig::new(GWEI),
};

/// Polygon Amoy Testnet (chain ID 80002).
pub const POLYGON_AMOY: EvmChain = EvmChain {
    chain: Chain::PolygonAmoy,
    chain_id: 80002,
    name: "Polygon Amoy",
    rpc_url: "https://rpc-amoy.polygon.technology",
    eip1559: true,
    op_stack: false,
    stake_hub: false,
    fee: EvmFeeConfig::new(30 * GWEI),
};

/// All supported EVM chains.
const ALL_CHAINS: &[&EvmChain] = &[
    &ETHEREUM,
    &BSC,
    &POLYGON,
    &ARBITRUM,
    &BASE,
    &OPTIMISM,
    &OPBNB,
    &AVALANCHE,
    &SEPOLIA,
    &POLYGON_AMOY,
];

/// Returns the definition for a wallet chain tag, or `None` for non-EVM chains.
pub fn for_chain(chain: Chain) -> Option<&'static EvmChain> {
    ALL_CHAINS.iter().find(|c| c.chain == chain).copied()
}
