//! Fee tiers for EVM chains.
//!
//! EIP-1559 chains derive their tiers from `eth_feeHistory`; chains without
//! a usable history, and legacy chains, scale `eth_gasPrice`. Every result
//! is ordered slow, market, fast and has no zero tier.

use alloy_primitives::U256;
use chain_params::{FeeMultipliers, Ratio};

use crate::error::EthError;
use crate::transaction::FeeParams;

/// Reward percentiles requested from `eth_feeHistory`, one per tier.
pub const REWARD_PERCENTILES: [u8; 3] = [25, 50, 75];

/// Number of past blocks requested from `eth_feeHistory`.
pub const FEE_HISTORY_BLOCKS: u64 = 5;

fn scale(value: U256, ratio: Ratio) -> Result<U256, EthError> {
    if ratio.denominator == 0 {
        return Err(EthError::FeeDataUnavailable("zero multiplier denominator".into()));
    }
    value
        .checked_mul(U256::from(ratio.numerator))
        .map(|v| v / U256::from(ratio.denominator))
        .ok_or_else(|| EthError::FeeDataUnavailable("fee overflow".into()))
}

/// Rounded (half up) average of the non-zero entries.
fn average_reward(rewards: &[U256]) -> Result<U256, EthError> {
    let non_zero: Vec<U256> = rewards.iter().copied().filter(|r| !r.is_zero()).collect();
    if non_zero.is_empty() {
        return Err(EthError::FeeDataUnavailable("no non-zero rewards".into()));
    }
    let sum = non_zero
        .iter()
        .try_fold(U256::ZERO, |acc, r| acc.checked_add(*r))
        .ok_or_else(|| EthError::FeeDataUnavailable("reward overflow".into()))?;
    let count = U256::from(non_zero.len());
    Ok((sum * U256::from(2u8) + count) / (count * U256::from(2u8)))
}

/// Monotonic clamp: each tier is at least the one before it.
fn clamp_monotonic(mut tiers: [U256; 3]) -> [U256; 3] {
    for i in 1..3 {
        if tiers[i] < tiers[i - 1] {
            tiers[i] = tiers[i - 1];
        }
    }
    tiers
}

/// EIP-1559 tiers from a fee history.
///
/// `base_fee_per_gas` ends with the pending block's base fee, which must be
/// non-zero. `reward` holds one row per block, one column per entry of
/// [`REWARD_PERCENTILES`].
pub fn eip1559_tiers(
    base_fee_per_gas: &[U256],
    reward: &[Vec<U256>],
    multipliers: &FeeMultipliers,
) -> Result<[FeeParams; 3], EthError> {
    let pending = base_fee_per_gas
        .last()
        .copied()
        .filter(|b| !b.is_zero())
        .ok_or_else(|| EthError::FeeDataUnavailable("missing pending base fee".into()))?;
    if reward.is_empty() {
        return Err(EthError::FeeDataUnavailable("empty reward history".into()));
    }

    let bases = clamp_monotonic([
        pending,
        scale(pending, multipliers.market)?,
        scale(pending, multipliers.fast)?,
    ]);

    let mut priorities = [U256::ZERO; 3];
    for (column, slot) in priorities.iter_mut().enumerate() {
        let values: Vec<U256> = reward.iter().filter_map(|row| row.get(column).copied()).collect();
        *slot = average_reward(&values)?;
    }
    let priorities = clamp_monotonic(priorities);

    Ok(std::array::from_fn(|i| FeeParams::Eip1559 {
        max_fee_per_gas: bases[i].saturating_add(priorities[i]),
        max_priority_fee_per_gas: priorities[i],
    }))
}

/// EIP-1559 tiers when no usable fee history exists: the gas price tiers
/// become the priority fee over a zero base fee.
pub fn eip1559_fallback_tiers(
    gas_price: U256,
    multipliers: &FeeMultipliers,
) -> Result<[FeeParams; 3], EthError> {
    let prices = gas_price_tiers(gas_price, multipliers)?;
    Ok(prices.map(|p| FeeParams::Eip1559 {
        max_fee_per_gas: p,
        max_priority_fee_per_gas: p,
    }))
}

/// Legacy tiers: `gasPrice * {1, market, fast}`.
pub fn legacy_tiers(
    gas_price: U256,
    multipliers: &FeeMultipliers,
) -> Result<[FeeParams; 3], EthError> {
    let prices = gas_price_tiers(gas_price, multipliers)?;
    Ok(prices.map(|gas_price| FeeParams::Legacy { gas_price }))
}

fn gas_price_tiers(gas_price: U256, multipliers: &FeeMultipliers) -> Result<[U256; 3], EthError> {
    if gas_price.is_zero() {
        return Err(EthError::FeeDataUnavailable("gas price is zero".into()));
    }
    Ok(clamp_monotonic([
        gas_price,
        scale(gas_price, multipliers.market)?,
        scale(gas_price, multipliers.fast)?,
    ]))
}

/// Chooses the tier source for a chain.
///
/// EIP-1559 chains use the fee history when it maps cleanly and fall back to
/// the gas price otherwise; legacy chains always use the gas price.
pub fn fee_tiers(
    eip1559: bool,
    history: Option<(&[U256], &[Vec<U256>])>,
    gas_price: Option<U256>,
    multipliers: &FeeMultipliers,
) -> Result<[FeeParams; 3], EthError> {
    if eip1559 {
        if let Some((base, reward)) = history {
            match eip1559_tiers(base, reward, multipliers) {
                Ok(tiers) => return Ok(tiers),
                Err(e) => tracing::debug!(error = %e, "fee history unusable, using gas price"),
            }
        }
        let price = gas_price
            .ok_or_else(|| EthError::FeeDataUnavailable("no fee history or gas price".into()))?;
        return eip1559_fallback_tiers(price, multipliers);
    }
    let price =
        gas_price.ok_or_else(|| EthError::FeeDataUnavailable("no gas price".into()))?;
    legacy_tiers(price, multipliers)
}
