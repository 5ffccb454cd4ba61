use crate::error::BtcError;
use crate::fee::{estimate_fee, SpendKind};

/// A single unspent transaction output (UTXO).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in base units (satoshis).
    pub amount_sat: u64,
    /// The locking script (scriptPubKey) serialized bytes; empty when the
    /// provider did not report it.
    pub script_pubkey: Vec<u8>,
}

/// Result of UTXO selection: the chosen UTXOs and their aggregate value.
#[derive(Debug, Clone)]
pub struct UtxoSelection {
    /// The selected UTXOs.
    pub selected: Vec<Utxo>,
    /// Total value of the selected UTXOs in satoshis.
    pub total_sat: u64,
    /// Fee for the selected inputs and two outputs.
    pub fee_sat: u64,
}

/// Select UTXOs to cover `target_sat` plus estimated fees.
///
/// Largest-first: outputs are ordered by value descending, ties broken by
/// txid then output index, so the same snapshot always yields the same
/// selection. The fee assumes two outputs (recipient + change).
pub fn select_utxos(
    utxos: &[Utxo],
    target_sat: u64,
    fee_rate: u64,
    kind: SpendKind,
) -> Result<UtxoSelection, BtcError> {
    if utxos.is_empty() {
        return Err(BtcError::NoUnspentOutputs);
    }

    let mut sorted: Vec<&Utxo> = utxos.iter().collect();
    sorted.sort_by(|a, b| {
        b.amount_sat
            .cmp(&a.amount_sat)
            .then_with(|| a.txid.cmp(&b.txid))
            .then_with(|| a.vout.cmp(&b.vout))
    });

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total_sat: u64 = 0;
    let mut fee_sat = 0;

    for utxo in sorted {
        selected.push(utxo.clone());
        total_sat = total_sat.saturating_add(utxo.amount_sat);

        fee_sat = estimate_fee(kind, selected.len(), 2, fee_rate);
        if total_sat >= target_sat.saturating_add(fee_sat) {
            return Ok(UtxoSelection {
                selected,
                total_sat,
                fee_sat,
            });
        }
    }

    Err(BtcError::InsufficientFunds {
        available: total_sat,
        required: target_sat.saturating_add(fee_sat),
    })
}
