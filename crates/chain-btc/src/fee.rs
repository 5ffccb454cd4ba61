//! Virtual-size estimates and fee tiers for UTXO transactions.

use chain_params::{AddressType, UtxoParams};

use crate::error::BtcError;

/// How the wallet's own outputs are locked and therefore spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendKind {
    P2pkh,
    P2wpkh,
}

impl SpendKind {
    /// `Default` spends native SegWit where the network supports it.
    pub fn for_address_type(address_type: AddressType, params: &UtxoParams) -> Self {
        match address_type {
            AddressType::Default if params.supports_segwit() => SpendKind::P2wpkh,
            _ => SpendKind::P2pkh,
        }
    }

    fn input_vbytes(self) -> u64 {
        match self {
            // 41 bytes non-witness + ~107 witness bytes / 4
            SpendKind::P2wpkh => 68,
            SpendKind::P2pkh => 148,
        }
    }

    fn output_vbytes(self) -> u64 {
        match self {
            SpendKind::P2wpkh => 31,
            SpendKind::P2pkh => 34,
        }
    }

    /// Version, locktime and counts, plus marker and flag for SegWit.
    fn overhead_vbytes(self) -> u64 {
        match self {
            SpendKind::P2wpkh => 11,
            SpendKind::P2pkh => 10,
        }
    }
}

/// Estimated virtual size of a transaction with the given shape.
pub fn estimate_vsize(kind: SpendKind, num_inputs: usize, num_outputs: usize) -> u64 {
    kind.overhead_vbytes()
        + num_inputs as u64 * kind.input_vbytes()
        + num_outputs as u64 * kind.output_vbytes()
}

/// `estimated_vsize * fee_rate` in base units.
pub fn estimate_fee(kind: SpendKind, num_inputs: usize, num_outputs: usize, fee_rate: u64) -> u64 {
    estimate_vsize(kind, num_inputs, num_outputs).saturating_mul(fee_rate)
}

/// One fee tier: the rate used and the absolute fee it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoFeeQuote {
    pub rate_per_vbyte: u64,
    pub fee: u64,
}

/// Turns three provider rates (slow, market, fast) into monotonic fee quotes.
///
/// Each rate is floored at the network's minimum relay rate, then clamped so
/// that slow <= market <= fast.
pub fn fee_tiers(
    rates: [u64; 3],
    params: &UtxoParams,
    kind: SpendKind,
    num_inputs: usize,
) -> Result<[UtxoFeeQuote; 3], BtcError> {
    if num_inputs == 0 {
        return Err(BtcError::NoUnspentOutputs);
    }
    let slow = rates[0].max(params.min_relay_fee_rate);
    let market = rates[1].max(slow);
    let fast = rates[2].max(market);

    Ok([slow, market, fast].map(|rate| UtxoFeeQuote {
        rate_per_vbyte: rate,
        fee: estimate_fee(kind, num_inputs, 2, rate),
    }))
}
