use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, OutPoint, PubkeyHash, Sequence, Transaction, TxIn, TxOut, Txid, WPubkeyHash, Witness,
};
use chain_params::UtxoParams;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};

use crate::address::{compress_pubkey, decode_address, hash160};
use crate::error::BtcError;
use crate::fee::SpendKind;
use crate::utxo::{select_utxos, Utxo};

/// An unsigned transaction plus everything needed to finalize it.
#[derive(Debug, Clone)]
pub struct UnsignedBtcTx {
    /// The transaction with empty scriptSigs and witnesses.
    pub tx: Transaction,
    /// The outputs being spent, in input order.
    pub prevouts: Vec<TxOut>,
    pub kind: SpendKind,
    /// One SIGHASH_ALL digest per input, in input order.
    pub sighashes: Vec<[u8; 32]>,
    /// Public key of the spending account, as it was hashed into its script.
    pub public_key: Vec<u8>,
    pub fee_sat: u64,
    /// `None` when the change was below dust and went to the fee.
    pub change_sat: Option<u64>,
}

/// A finalized transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBtcTx {
    pub raw_tx: Vec<u8>,
    /// Transaction id in display (big-endian) hex.
    pub txid: String,
}

/// Locking script of the account that owns `public_key` for this spend kind.
pub fn source_script(public_key: &[u8], kind: SpendKind) -> Result<ScriptBuf, BtcError> {
    Ok(match kind {
        SpendKind::P2wpkh => {
            let compressed = compress_pubkey(public_key)?;
            ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array(hash160(&compressed)))
        }
        SpendKind::P2pkh => {
            compress_pubkey(public_key)?;
            ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash160(public_key)))
        }
    })
}

/// Build an unsigned transfer from the account owning `public_key`.
///
/// Outputs are the recipient first, then change back to the source script
/// when it is at least the network's dust threshold; smaller change is left
/// to the fee. Every selected output must be locked to the source script.
#[allow(clippy::too_many_arguments)]
pub fn build_transaction(
    params: &UtxoParams,
    utxos: &[Utxo],
    recipient: &str,
    amount_sat: u64,
    public_key: &[u8],
    kind: SpendKind,
    fee_rate: u64,
) -> Result<UnsignedBtcTx, BtcError> {
    if amount_sat < params.dust_threshold {
        return Err(BtcError::DustAmount {
            amount: amount_sat,
            dust: params.dust_threshold,
        });
    }
    let recipient_script = decode_address(recipient, params)?.script_pubkey()?;
    let own_script = source_script(public_key, kind)?;

    let selection = select_utxos(utxos, amount_sat, fee_rate, kind)?;

    let mut inputs = Vec::with_capacity(selection.selected.len());
    let mut prevouts = Vec::with_capacity(selection.selected.len());
    for utxo in &selection.selected {
        if !utxo.script_pubkey.is_empty() && utxo.script_pubkey != own_script.as_bytes() {
            return Err(BtcError::TransactionBuildError(format!(
                "output {}:{} is not locked to the source address",
                utxo.txid, utxo.vout
            )));
        }
        let txid: Txid = utxo
            .txid
            .parse()
            .map_err(|e| BtcError::TransactionBuildError(format!("invalid txid: {e}")))?;

        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        });
        prevouts.push(TxOut {
            value: Amount::from_sat(utxo.amount_sat),
            script_pubkey: own_script.clone(),
        });
    }

    let change = selection
        .total_sat
        .saturating_sub(amount_sat.saturating_add(selection.fee_sat));

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(amount_sat),
        script_pubkey: recipient_script,
    }];
    let (fee_sat, change_sat) = if change >= params.dust_threshold {
        outputs.push(TxOut {
            value: Amount::from_sat(change),
            script_pubkey: own_script.clone(),
        });
        (selection.fee_sat, Some(change))
    } else {
        // One output: no change (dust goes to fee).
        (selection.total_sat - amount_sat, None)
    };

    let tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };
    let sighashes = compute_sighashes(&tx, &prevouts, kind)?;

    tracing::debug!(
        network = params.name,
        inputs = tx.input.len(),
        outputs = tx.output.len(),
        fee_sat,
        "built utxo transaction"
    );

    Ok(UnsignedBtcTx {
        tx,
        prevouts,
        kind,
        sighashes,
        public_key: public_key.to_vec(),
        fee_sat,
        change_sat,
    })
}

fn compute_sighashes(
    tx: &Transaction,
    prevouts: &[TxOut],
    kind: SpendKind,
) -> Result<Vec<[u8; 32]>, BtcError> {
    let mut cache = SighashCache::new(tx);
    prevouts
        .iter()
        .enumerate()
        .map(|(index, prevout)| match kind {
            SpendKind::P2wpkh => cache
                .p2wpkh_signature_hash(
                    index,
                    &prevout.script_pubkey,
                    prevout.value,
                    EcdsaSighashType::All,
                )
                .map(|h| h.to_byte_array())
                .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}"))),
            SpendKind::P2pkh => cache
                .legacy_signature_hash(index, &prevout.script_pubkey, EcdsaSighashType::All.to_u32())
                .map(|h| h.to_byte_array())
                .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}"))),
        })
        .collect()
}

impl UnsignedBtcTx {
    /// Injects one 64-byte `r || s` signature per input and serializes the
    /// result. A trailing recovery byte (65-byte input) is ignored.
    ///
    /// Signatures are normalized to low-S, DER encoded with SIGHASH_ALL
    /// appended, and checked against the input's digest before use.
    pub fn finalize(&self, signatures: &[Vec<u8>]) -> Result<SignedBtcTx, BtcError> {
        if signatures.len() != self.tx.input.len() {
            return Err(BtcError::SigningError(format!(
                "expected {} signatures, got {}",
                self.tx.input.len(),
                signatures.len()
            )));
        }

        let verifying_key = VerifyingKey::from_sec1_bytes(&self.public_key)
            .map_err(|e| BtcError::InvalidPublicKey(format!("{e}")))?;
        let compressed = compress_pubkey(&self.public_key)?;

        let mut tx = self.tx.clone();
        for (index, raw) in signatures.iter().enumerate() {
            let signature = parse_signature(raw)?;
            verifying_key
                .verify_prehash(&self.sighashes[index], &signature)
                .map_err(|_| {
                    BtcError::SigningError(format!("signature {index} does not match its digest"))
                })?;

            let mut sig_bytes = signature.to_der().as_bytes().to_vec();
            sig_bytes.push(EcdsaSighashType::All as u8);

            match self.kind {
                SpendKind::P2wpkh => {
                    let mut witness = Witness::new();
                    witness.push(&sig_bytes);
                    witness.push(compressed);
                    tx.input[index].witness = witness;
                }
                SpendKind::P2pkh => {
                    tx.input[index].script_sig = Builder::new()
                        .push_slice(push_bytes(sig_bytes)?)
                        .push_slice(push_bytes(self.public_key.clone())?)
                        .into_script();
                }
            }
        }

        Ok(SignedBtcTx {
            raw_tx: bitcoin::consensus::serialize(&tx),
            txid: tx.compute_txid().to_string(),
        })
    }
}

fn parse_signature(raw: &[u8]) -> Result<Signature, BtcError> {
    let compact = match raw.len() {
        64 => raw,
        65 => &raw[..64],
        n => {
            return Err(BtcError::SigningError(format!(
                "signature must be 64 bytes, got {n}"
            )))
        }
    };
    let signature = Signature::from_slice(compact)
        .map_err(|e| BtcError::SigningError(format!("malformed signature: {e}")))?;
    Ok(signature.normalize_s().unwrap_or(signature))
}

fn push_bytes(data: Vec<u8>) -> Result<PushBytesBuf, BtcError> {
    PushBytesBuf::try_from(data).map_err(|e| BtcError::SigningError(format!("script push: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{default_address, legacy_address};
    use chain_params::utxo::{BITCOIN, DOGECOIN};
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::SigningKey;

    const RECIPIENT: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    fn signing_key() -> SigningKey {
        SigningKey::from_slice(&[0x42; 32]).unwrap()
    }

    fn pubkey() -> Vec<u8> {
        signing_key()
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    fn utxo(txid_byte: &str, vout: u32, amount: u64) -> Utxo {
        Utxo {
            txid: txid_byte.repeat(64),
            vout,
            amount_sat: amount,
            script_pubkey: Vec::new(),
        }
    }

    fn sign_all(unsigned: &UnsignedBtcTx) -> Vec<Vec<u8>> {
        unsigned
            .sighashes
            .iter()
            .map(|digest| {
                let sig: Signature = signing_key().sign_prehash(digest).unwrap();
                sig.to_bytes().to_vec()
            })
            .collect()
    }

    #[test]
    fn build_transaction_single_input_with_change() {
        let unsigned = build_transaction(
            &BITCOIN,
            &[utxo("a", 0, 100_000)],
            RECIPIENT,
            50_000,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        )
        .unwrap();

        assert_eq!(unsigned.tx.input.len(), 1);
        assert_eq!(unsigned.tx.output.len(), 2);
        assert_eq!(unsigned.tx.output[0].value.to_sat(), 50_000);
        assert_eq!(unsigned.fee_sat, 141);
        assert_eq!(unsigned.change_sat, Some(100_000 - 50_000 - 141));
        assert_eq!(unsigned.tx.version, Version::ONE);
        assert_eq!(unsigned.tx.input[0].sequence, Sequence::MAX);
        assert_eq!(unsigned.sighashes.len(), 1);
        // Change goes back to the source script.
        assert_eq!(
            unsigned.tx.output[1].script_pubkey,
            source_script(&pubkey(), SpendKind::P2wpkh).unwrap()
        );
    }

    #[test]
    fn build_transaction_dust_change_omitted() {
        let unsigned = build_transaction(
            &BITCOIN,
            &[utxo("b", 0, 100_000)],
            RECIPIENT,
            99_700,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        )
        .unwrap();

        assert_eq!(unsigned.tx.output.len(), 1);
        assert_eq!(unsigned.change_sat, None);
        assert_eq!(unsigned.fee_sat, 300);
    }

    #[test]
    fn build_transaction_insufficient_funds() {
        let result = build_transaction(
            &BITCOIN,
            &[utxo("c", 0, 1_000)],
            RECIPIENT,
            500_000,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        );
        assert!(matches!(result, Err(BtcError::InsufficientFunds { .. })));
    }

    #[test]
    fn build_transaction_rejects_dust_amount() {
        let result = build_transaction(
            &BITCOIN,
            &[utxo("c", 0, 100_000)],
            RECIPIENT,
            100,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        );
        assert!(matches!(result, Err(BtcError::DustAmount { .. })));
    }

    #[test]
    fn build_transaction_invalid_recipient() {
        let result = build_transaction(
            &BITCOIN,
            &[utxo("d", 0, 100_000)],
            "not_a_valid_address",
            50_000,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn build_transaction_rejects_foreign_utxo() {
        let mut foreign = utxo("e", 0, 100_000);
        foreign.script_pubkey = vec![0x00, 0x14, 0x11, 0x22];
        let result = build_transaction(
            &BITCOIN,
            &[foreign],
            RECIPIENT,
            50_000,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        );
        assert!(matches!(result, Err(BtcError::TransactionBuildError(_))));
    }

    #[test]
    fn segwit_finalize_produces_witness() {
        let unsigned = build_transaction(
            &BITCOIN,
            &[utxo("a", 0, 60_000), utxo("b", 1, 60_000)],
            RECIPIENT,
            100_000,
            &pubkey(),
            SpendKind::P2wpkh,
            2,
        )
        .unwrap();
        assert_eq!(unsigned.tx.input.len(), 2);

        let signed = unsigned.finalize(&sign_all(&unsigned)).unwrap();
        let tx: Transaction = bitcoin::consensus::deserialize(&signed.raw_tx).unwrap();
        assert_eq!(tx.compute_txid().to_string(), signed.txid);
        for input in &tx.input {
            assert!(input.script_sig.is_empty());
            assert_eq!(input.witness.len(), 2);
            let sig = input.witness.nth(0).unwrap();
            assert_eq!(*sig.last().unwrap(), 0x01);
            assert_eq!(input.witness.nth(1).unwrap(), pubkey().as_slice());
        }
    }

    #[test]
    fn legacy_finalize_produces_script_sig() {
        let unsigned = build_transaction(
            &DOGECOIN,
            &[utxo("a", 0, 500_000_000)],
            &legacy_address(&pubkey(), &DOGECOIN).unwrap(),
            100_000_000,
            &pubkey(),
            SpendKind::P2pkh,
            1_000,
        )
        .unwrap();

        let signed = unsigned.finalize(&sign_all(&unsigned)).unwrap();
        let tx: Transaction = bitcoin::consensus::deserialize(&signed.raw_tx).unwrap();
        assert!(tx.input[0].witness.is_empty());
        let pushes: Vec<_> = tx.input[0]
            .script_sig
            .instructions()
            .map(|i| i.unwrap().push_bytes().unwrap().as_bytes().to_vec())
            .collect();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[0][0], 0x30); // DER sequence
        assert_eq!(pushes[1], pubkey());
    }

    #[test]
    fn high_s_signature_is_normalized() {
        let unsigned = build_transaction(
            &BITCOIN,
            &[utxo("a", 0, 100_000)],
            RECIPIENT,
            50_000,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        )
        .unwrap();

        let sig: Signature = signing_key().sign_prehash(&unsigned.sighashes[0]).unwrap();
        let low = sig.normalize_s().unwrap_or(sig);
        let mut high_bytes = low.to_bytes().to_vec();
        high_bytes[32..].copy_from_slice(&(-*low.s()).to_bytes());
        let high = Signature::from_slice(&high_bytes).unwrap();
        assert!(high.normalize_s().is_some());

        let from_low = unsigned.finalize(&[low.to_bytes().to_vec()]).unwrap();
        let from_high = unsigned.finalize(&[high.to_bytes().to_vec()]).unwrap();
        assert_eq!(from_low, from_high);
    }

    #[test]
    fn finalize_rejects_wrong_signature_count_or_digest() {
        let unsigned = build_transaction(
            &BITCOIN,
            &[utxo("a", 0, 100_000)],
            RECIPIENT,
            50_000,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        )
        .unwrap();
        assert!(unsigned.finalize(&[]).is_err());

        let wrong: Signature = signing_key().sign_prehash(&[7u8; 32]).unwrap();
        assert!(unsigned.finalize(&[wrong.to_bytes().to_vec()]).is_err());
        assert!(unsigned.finalize(&[vec![0u8; 10]]).is_err());
    }

    #[test]
    fn recipient_can_be_own_default_address() {
        let own = default_address(&pubkey(), &BITCOIN).unwrap();
        let unsigned = build_transaction(
            &BITCOIN,
            &[utxo("a", 0, 100_000)],
            &own,
            10_000,
            &pubkey(),
            SpendKind::P2wpkh,
            1,
        )
        .unwrap();
        assert_eq!(unsigned.tx.output[0].script_pubkey, unsigned.tx.output[1].script_pubkey);
    }
}
