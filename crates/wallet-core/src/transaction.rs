//! Built transactions and their lifecycle.
//!
//! ```text
//! Built -> Signed -> BroadcastPending -> Confirmed
//!                                     -> Rejected
//! ```
//!
//! A [`TransactionRecord`] owns the chain-specific unsigned payload. Signing
//! moves it to `Signed` exactly once: finalizing again with the same
//! signatures hands back the same signed transaction, anything else is an
//! invalid transition.

use chain_btc::UnsignedBtcTx;
use chain_cosmos::UnsignedCosmosTx;
use chain_dot::UnsignedExtrinsic;
use chain_eth::EthTransaction;
use chain_params::Chain;
use chain_provider::TxStatus;
use chain_sol::UnsignedSolTx;
use serde::Serialize;

use crate::error::BuildError;
use crate::signer::{PayloadKind, SignRequest};
use crate::types::{Fee, TransferIntent};

/// The unsigned transaction of one chain family.
#[derive(Debug, Clone)]
pub enum SignablePayload {
    Utxo(UnsignedBtcTx),
    Evm {
        tx: EthTransaction,
        /// Key the signature is checked against when the parity is recovered.
        public_key: Vec<u8>,
    },
    Cosmos(UnsignedCosmosTx),
    Solana(UnsignedSolTx),
    Substrate(UnsignedExtrinsic),
}

/// A transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw_tx: Vec<u8>,
    pub tx_hash: String,
    /// JSON body for chains that broadcast an envelope instead of raw bytes.
    pub envelope: Option<String>,
}

impl SignablePayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            SignablePayload::Utxo(_) | SignablePayload::Evm { .. } | SignablePayload::Cosmos(_) => {
                PayloadKind::Secp256k1Digest
            }
            SignablePayload::Solana(_) | SignablePayload::Substrate(_) => {
                PayloadKind::Ed25519Message
            }
        }
    }

    /// What the signer signs, one entry per expected signature.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        match self {
            SignablePayload::Utxo(tx) => tx.sighashes.iter().map(|h| h.to_vec()).collect(),
            SignablePayload::Evm { tx, .. } => vec![tx.signing_hash().to_vec()],
            SignablePayload::Cosmos(tx) => vec![tx.digest.to_vec()],
            SignablePayload::Solana(tx) => vec![tx.message_bytes.clone()],
            SignablePayload::Substrate(tx) => vec![tx.signing_payload.clone()],
        }
    }

    /// Injects the signatures and serializes the broadcast form.
    pub fn finalize(&self, signatures: &[Vec<u8>]) -> Result<SignedTransaction, BuildError> {
        let single = || -> Result<&[u8], BuildError> {
            match signatures {
                [only] => Ok(only.as_slice()),
                _ => Err(BuildError::InvalidSignature(format!(
                    "expected 1 signature, got {}",
                    signatures.len()
                ))),
            }
        };

        let signed = match self {
            SignablePayload::Utxo(tx) => {
                let signed = tx.finalize(signatures)?;
                SignedTransaction {
                    raw_tx: signed.raw_tx,
                    tx_hash: signed.txid,
                    envelope: None,
                }
            }
            SignablePayload::Evm { tx, public_key } => {
                let signed = tx.finalize(single()?, public_key)?;
                SignedTransaction {
                    raw_tx: signed.raw_tx,
                    tx_hash: signed.tx_hash,
                    envelope: None,
                }
            }
            SignablePayload::Cosmos(tx) => {
                let signed = tx.finalize(single()?)?;
                SignedTransaction {
                    raw_tx: signed.tx_bytes,
                    tx_hash: signed.tx_hash,
                    envelope: Some(signed.envelope),
                }
            }
            SignablePayload::Solana(tx) => {
                let signed = tx.finalize(signatures)?;
                SignedTransaction {
                    raw_tx: signed.raw_tx,
                    tx_hash: signed.signature,
                    envelope: None,
                }
            }
            SignablePayload::Substrate(tx) => {
                let signed = tx.finalize(single()?)?;
                SignedTransaction {
                    raw_tx: signed.raw_tx,
                    tx_hash: signed.tx_hash,
                    envelope: None,
                }
            }
        };
        Ok(signed)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TransactionState {
    Built,
    Signed,
    BroadcastPending,
    Confirmed { block: Option<u64> },
    Rejected { reason: String },
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Confirmed { .. } | TransactionState::Rejected { .. }
        )
    }

    fn name(&self) -> &'static str {
        match self {
            TransactionState::Built => "Built",
            TransactionState::Signed => "Signed",
            TransactionState::BroadcastPending => "BroadcastPending",
            TransactionState::Confirmed { .. } => "Confirmed",
            TransactionState::Rejected { .. } => "Rejected",
        }
    }
}

impl From<&TxStatus> for TransactionState {
    fn from(status: &TxStatus) -> Self {
        match status {
            TxStatus::Pending => TransactionState::BroadcastPending,
            TxStatus::Confirmed { block } => TransactionState::Confirmed { block: *block },
            TxStatus::Failed { reason } => TransactionState::Rejected {
                reason: reason.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub chain: Chain,
    pub intent: TransferIntent,
    pub fee: Fee,
    payload: SignablePayload,
    state: TransactionState,
    signatures: Option<Vec<Vec<u8>>>,
    signed: Option<SignedTransaction>,
}

impl TransactionRecord {
    pub fn new(chain: Chain, intent: TransferIntent, fee: Fee, payload: SignablePayload) -> Self {
        Self {
            chain,
            intent,
            fee,
            payload,
            state: TransactionState::Built,
            signatures: None,
            signed: None,
        }
    }

    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn payload(&self) -> &SignablePayload {
        &self.payload
    }

    pub fn signed(&self) -> Option<&SignedTransaction> {
        self.signed.as_ref()
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.signed.as_ref().map(|s| s.tx_hash.as_str())
    }

    pub fn sign_request(&self) -> SignRequest {
        SignRequest {
            kind: self.payload.kind(),
            payloads: self.payload.payloads(),
            description: format!(
                "send {} to {} on {}",
                self.intent.amount,
                self.intent.destination,
                self.chain.display_name()
            ),
        }
    }

    fn invalid(&self, action: &str) -> BuildError {
        BuildError::InvalidState(format!("cannot {action} a {} transaction", self.state.name()))
    }

    /// `Built -> Signed`.
    pub fn finalize(&mut self, signatures: Vec<Vec<u8>>) -> Result<&SignedTransaction, BuildError> {
        if let Some(previous) = &self.signatures {
            if *previous != signatures {
                return Err(BuildError::InvalidState(
                    "transaction is already signed with different signatures".into(),
                ));
            }
            return self.signed.as_ref().ok_or_else(|| self.invalid("finalize"));
        }
        if self.state != TransactionState::Built {
            return Err(self.invalid("finalize"));
        }

        let signed = self.payload.finalize(&signatures)?;
        tracing::debug!(chain = ?self.chain, tx_hash = %signed.tx_hash, "transaction finalized");
        self.signatures = Some(signatures);
        self.state = TransactionState::Signed;
        let signed = self.signed.insert(signed);
        Ok(&*signed)
    }

    /// `Signed -> BroadcastPending`.
    pub fn mark_broadcast(&mut self) -> Result<(), BuildError> {
        if self.state != TransactionState::Signed {
            return Err(self.invalid("broadcast"));
        }
        self.state = TransactionState::BroadcastPending;
        Ok(())
    }

    /// Applies a status report to a broadcast transaction. Terminal states
    /// are kept as they are.
    pub fn apply_status(&mut self, status: &TxStatus) -> Result<&TransactionState, BuildError> {
        if self.state.is_terminal() {
            return Ok(&self.state);
        }
        if self.state != TransactionState::BroadcastPending {
            return Err(self.invalid("track"));
        }
        self.state = TransactionState::from(status);
        Ok(&self.state)
    }
}
