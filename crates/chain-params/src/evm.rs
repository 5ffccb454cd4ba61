use serde::Serialize;

/// Definition of an EVM-compatible blockchain network.
#[derive(Debug, Clone, Serialize)]
pub struct EvmParams {
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub explorer_url: &'static str,
    pub is_testnet: bool,
    /// Whether fee quotes and builds use EIP-1559 (type 2) transactions.
    pub eip1559: bool,
}

/// Ethereum Mainnet (chain ID 1).
pub const ETHEREUM: EvmParams = EvmParams {
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://etherscan.io",
    is_testnet: false,
    eip1559: true,
};

/// Polygon PoS (chain ID 137).
pub const POLYGON: EvmParams = EvmParams {
    chain_id: 137,
    name: "Polygon",
    symbol: "MATIC",
    decimals: 18,
    explorer_url: "https://polygonscan.com",
    is_testnet: false,
    eip1559: true,
};

/// Arbitrum One (chain ID 42161).
pub const ARBITRUM: EvmParams = EvmParams {
    chain_id: 42161,
    name: "Arbitrum One",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://arbiscan.io",
    is_testnet: false,
    eip1559: true,
};

/// Base (chain ID 8453).
pub const BASE: EvmParams = EvmParams {
    chain_id: 8453,
    name: "Base",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://basescan.org",
    is_testnet: false,
    eip1559: true,
};

/// Optimism (chain ID 10).
pub const OPTIMISM: EvmParams = EvmParams {
    chain_id: 10,
    name: "Optimism",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://optimistic.etherscan.io",
    is_testnet: false,
    eip1559: true,
};

/// BNB Smart Chain (chain ID 56). Quoted with legacy gas pricing.
pub const BSC: EvmParams = EvmParams {
    chain_id: 56,
    name: "BNB Smart Chain",
    symbol: "BNB",
    decimals: 18,
    explorer_url: "https://bscscan.com",
    is_testnet: false,
    eip1559: false,
};

/// Avalanche C-Chain (chain ID 43114).
pub const AVALANCHE: EvmParams = EvmParams {
    chain_id: 43114,
    name: "Avalanche C-Chain",
    symbol: "AVAX",
    decimals: 18,
    explorer_url: "https://snowtrace.io",
    is_testnet: false,
    eip1559: true,
};

/// Sepolia Testnet (chain ID 11155111).
pub const SEPOLIA: EvmParams = EvmParams {
    chain_id: 11155111,
    name: "Sepolia",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://sepolia.etherscan.io",
    is_testnet: true,
    eip1559: true,
};

/// Polygon Amoy Testnet (chain ID 80002).
pub const POLYGON_AMOY: EvmParams = EvmParams {
    chain_id: 80002,
    name: "Polygon Amoy",
    symbol: "MATIC",
    decimals: 18,
    explorer_url: "https://amoy.polygonscan.com",
    is_testnet: true,
    eip1559: true,
};
