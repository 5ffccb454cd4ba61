use serde::Serialize;

/// Constants for a Cosmos SDK chain.
#[derive(Debug, Clone, Serialize)]
pub struct CosmosParams {
    pub chain_id: &'static str,
    pub bech32_hrp: &'static str,
    pub denom: &'static str,
    /// Gas price per tier (slow, market, fast) in thousandths of `denom`.
    pub gas_prices_milli: [u64; 3],
    pub default_gas_limit: u64,
}

pub const COSMOS_HUB: CosmosParams = CosmosParams {
    chain_id: "cosmoshub-4",
    bech32_hrp: "cosmos",
    denom: "uatom",
    gas_prices_milli: [10, 25, 40],
    default_gas_limit: 200_000,
};

/// Public Gaia test chain.
pub const GAIA_TESTNET: CosmosParams = CosmosParams {
    chain_id: "gaia-13003",
    bech32_hrp: "cosmos",
    denom: "muon",
    gas_prices_milli: [1, 1, 2],
    default_gas_limit: 200_000,
};

pub const TERRA_CLASSIC: CosmosParams = CosmosParams {
    chain_id: "columbus-5",
    bech32_hrp: "terra",
    denom: "uluna",
    gas_prices_milli: [28_325, 28_325, 34_000],
    default_gas_limit: 200_000,
};
