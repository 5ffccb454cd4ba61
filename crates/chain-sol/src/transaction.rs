//! Native SOL transfers and the transaction wire format.
//!
//! ```text
//! Transaction:
//!   signatures   compact-u16 count, 64 bytes each
//!   message      see `message`
//! ```

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::SolError;
use crate::message::{AccountMeta, Instruction, Message};
use crate::short_vec;

/// The System Program: 32 zero bytes.
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

/// A compiled message awaiting signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedSolTx {
    pub message: Message,
    /// The serialized message; this is what every signer signs.
    pub message_bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSolTx {
    pub raw_tx: Vec<u8>,
    /// Base58 of the first signature, which is the transaction id.
    pub signature: String,
}

/// System Program transfer of `lamports` from `from` to `to`.
pub fn system_transfer_instruction(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            AccountMeta {
                pubkey: *from,
                is_signer: true,
                is_writable: true,
            },
            AccountMeta {
                pubkey: *to,
                is_signer: false,
                is_writable: true,
            },
        ],
        data,
    }
}

/// Builds an unsigned native SOL transfer paid for by `from`.
pub fn build_sol_transfer(
    from: &[u8; 32],
    to: &[u8; 32],
    lamports: u64,
    recent_blockhash: &[u8; 32],
) -> Result<UnsignedSolTx, SolError> {
    if lamports == 0 {
        return Err(SolError::TransactionBuildError("lamports must be > 0".into()));
    }
    let instruction = system_transfer_instruction(from, to, lamports);
    let message = Message::compile_legacy(&[instruction], from, recent_blockhash)?;
    tracing::debug!(lamports, "built sol transfer");
    UnsignedSolTx::new(message)
}

impl UnsignedSolTx {
    pub fn new(message: Message) -> Result<Self, SolError> {
        let message_bytes = message.serialize()?;
        Ok(Self {
            message,
            message_bytes,
        })
    }

    /// Attaches one 64-byte Ed25519 signature per required signer, in
    /// account-key order. Each signature is verified against its signer's
    /// key before it is written.
    pub fn finalize(&self, signatures: &[Vec<u8>]) -> Result<SignedSolTx, SolError> {
        let required = self.message.header.num_required_signatures as usize;
        if signatures.len() != required {
            return Err(SolError::SigningError(format!(
                "expected {required} signatures, got {}",
                signatures.len()
            )));
        }

        let mut raw_tx = short_vec::encode_len(required)?;
        for (index, raw) in signatures.iter().enumerate() {
            let signer = self.message.account_keys.get(index).ok_or_else(|| {
                SolError::SigningError(format!("no account key for signer {index}"))
            })?;
            let key = VerifyingKey::from_bytes(signer)
                .map_err(|e| SolError::InvalidPublicKey(format!("{e}")))?;
            let signature = Signature::from_slice(raw)
                .map_err(|e| SolError::SigningError(format!("malformed signature: {e}")))?;
            key.verify(&self.message_bytes, &signature).map_err(|_| {
                SolError::SigningError(format!("signature {index} does not verify"))
            })?;
            raw_tx.extend_from_slice(&signature.to_bytes());
        }
        raw_tx.extend_from_slice(&self.message_bytes);

        let signature = bs58::encode(&signatures[0]).into_string();
        Ok(SignedSolTx { raw_tx, signature })
    }
}

/// Splits a wire transaction into its signatures and message.
pub fn parse_transaction(raw_tx: &[u8]) -> Result<(Vec<[u8; 64]>, Message), SolError> {
    let mut buf = raw_tx;
    let count = short_vec::decode(&mut buf)? as usize;
    if buf.len() < count * 64 {
        return Err(SolError::SerializationError(
            "transaction too short: signature slots exceed length".into(),
        ));
    }
    let mut signatures = Vec::with_capacity(count);
    for chunk in buf[..count * 64].chunks_exact(64) {
        let mut sig = [0u8; 64];
        sig.copy_from_slice(chunk);
        signatures.push(sig);
    }
    buf = &buf[count * 64..];

    let message = Message::deserialize(&mut buf)?;
    if !buf.is_empty() {
        return Err(SolError::SerializationError(format!(
            "{} trailing bytes after message",
            buf.len()
        )));
    }
    Ok((signatures, message))
}
