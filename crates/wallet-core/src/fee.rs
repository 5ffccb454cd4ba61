//! Fee quotes for every chain family, ordered slow, market, fast.
//!
//! Each function turns the upstream data one family relies on into three
//! [`Fee`]s. Missing or degenerate data is `FeeDataUnavailable`; a zero fee
//! is never quoted.

use alloy_primitives::U256;
use chain_btc::SpendKind;
use chain_eth::fee::fee_tiers as evm_tiers;
use chain_eth::FeeParams;
use chain_params::{CosmosParams, EvmParams, FeeMultipliers, UtxoParams};
use chain_provider::evm::FeeHistory;

use crate::error::BuildError;
use crate::types::{Fee, FeeParameters, FeeTier};

fn quotes(tiers: [(U256, FeeParameters); 3]) -> Result<Vec<Fee>, BuildError> {
    let fees: Vec<Fee> = FeeTier::ALL
        .into_iter()
        .zip(tiers)
        .map(|(tier, (amount, parameters))| Fee {
            tier,
            amount,
            parameters,
        })
        .collect();

    if let Some(zero) = fees.iter().find(|f| f.amount.is_zero()) {
        return Err(BuildError::FeeDataUnavailable(format!(
            "{:?} tier is zero",
            zero.tier
        )));
    }
    if fees.windows(2).any(|w| w[0].amount > w[1].amount) {
        return Err(BuildError::FeeDataUnavailable("fee tiers are not monotonic".into()));
    }
    Ok(fees)
}

/// UTXO tiers from three per-vbyte rates for `num_inputs` inputs and two outputs.
pub fn utxo_fees(
    rates: [u64; 3],
    params: &UtxoParams,
    kind: SpendKind,
    num_inputs: usize,
) -> Result<Vec<Fee>, BuildError> {
    let tiers = chain_btc::fee::fee_tiers(rates, params, kind, num_inputs)?;
    quotes(tiers.map(|q| {
        (
            U256::from(q.fee),
            FeeParameters::Utxo {
                rate_per_vbyte: q.rate_per_vbyte,
            },
        )
    }))
}

/// EVM tiers for a transaction of `gas_limit` gas.
///
/// EIP-1559 chains use `history` when it is usable and fall back to
/// `gas_price`; legacy chains always scale `gas_price`.
pub fn evm_fees(
    params: &EvmParams,
    history: Option<&FeeHistory>,
    gas_price: Option<U256>,
    gas_limit: u64,
    multipliers: &FeeMultipliers,
) -> Result<Vec<Fee>, BuildError> {
    if gas_limit == 0 {
        return Err(BuildError::FeeDataUnavailable("gas limit is zero".into()));
    }
    let history = history.map(|h| (h.base_fee_per_gas.as_slice(), h.reward.as_slice()));
    let tiers = evm_tiers(params.eip1559, history, gas_price, multipliers)?;

    quotes(tiers.map(|fee| {
        let parameters = match fee {
            FeeParams::Legacy { gas_price } => FeeParameters::EvmLegacy {
                gas_price,
                gas_limit,
            },
            FeeParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => FeeParameters::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
                gas_limit,
            },
        };
        (fee.max_cost(gas_limit), parameters)
    }))
}

/// Cosmos tiers from a simulated `gas_used`, or the chain default gas.
pub fn cosmos_fees(params: &CosmosParams, gas_used: Option<u64>) -> Result<Vec<Fee>, BuildError> {
    let gas_limit = chain_cosmos::fee::gas_limit(params, gas_used)?;
    let tiers = chain_cosmos::fee::fee_tiers(params, gas_limit)?;
    quotes(tiers.map(|q| {
        (
            U256::from(q.amount),
            FeeParameters::Cosmos {
                gas_limit: q.gas_limit,
            },
        )
    }))
}

/// Solana charges the message fee whatever the tier.
pub fn solana_fees(message_fee: u64, num_signatures: usize) -> Result<Vec<Fee>, BuildError> {
    if num_signatures == 0 {
        return Err(BuildError::FeeDataUnavailable("message has no signers".into()));
    }
    let per_signature = message_fee / num_signatures as u64;
    quotes([(); 3].map(|_| {
        (
            U256::from(message_fee),
            FeeParameters::Solana {
                lamports_per_signature: per_signature,
            },
        )
    }))
}

/// Substrate quotes the runtime's partial fee for every tier.
pub fn substrate_fees(partial_fee: u128) -> Result<Vec<Fee>, BuildError> {
    quotes([(); 3].map(|_| {
        (
            U256::from(partial_fee),
            FeeParameters::Substrate { partial_fee },
        )
    }))
}

/// The quote for `tier`.
pub fn select(fees: &[Fee], tier: FeeTier) -> Result<&Fee, BuildError> {
    fees.iter()
        .find(|f| f.tier == tier)
        .ok_or_else(|| BuildError::FeeDataUnavailable(format!("no {tier:?} quote")))
}
