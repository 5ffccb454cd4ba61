//! Fee tiers for Cosmos chains: `gas_limit * gas_price`, per tier.

use chain_params::{CosmosParams, Ratio};

use crate::error::CosmosError;

/// Headroom applied to a simulated `gas_used` before it becomes a gas limit.
pub const GAS_ADJUSTMENT: Ratio = Ratio::new(13, 10);

/// One fee tier in the chain's fee denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmosFeeQuote {
    pub gas_limit: u64,
    pub amount: u128,
}

/// Gas limit for a transaction whose simulation used `gas_used`, or the
/// chain default when no simulation is available.
pub fn gas_limit(params: &CosmosParams, gas_used: Option<u64>) -> Result<u64, CosmosError> {
    let Some(used) = gas_used.filter(|g| *g > 0) else {
        return Ok(params.default_gas_limit);
    };
    GAS_ADJUSTMENT
        .apply(u128::from(used))
        .and_then(|g| u64::try_from(g).ok())
        .ok_or_else(|| CosmosError::TransactionBuildError(format!("gas {used} overflows")))
}

/// `ceil(gas_limit * price_milli / 1000)` for each of the chain's price tiers.
pub fn fee_tiers(params: &CosmosParams, gas_limit: u64) -> Result<[CosmosFeeQuote; 3], CosmosError> {
    if gas_limit == 0 {
        return Err(CosmosError::TransactionBuildError("gas limit must be > 0".into()));
    }
    let quote = |price_milli: u64| {
        let milli = u128::from(gas_limit) * u128::from(price_milli);
        CosmosFeeQuote {
            gas_limit,
            amount: milli.div_ceil(1000).max(1),
        }
    };
    Ok(params.gas_prices_milli.map(quote))
}
