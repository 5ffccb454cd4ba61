//! Signed `balances` transfer extrinsics.
//!
//! ```text
//! payload   = call || extra || spec_version || tx_version || genesis || block_hash [|| 0x00]
//! extra     = era || compact(nonce) || compact(tip) [|| 0x00]
//! extrinsic = compact(len) || 0x84 || signer || 0x00 || signature || extra || call
//! ```
//!
//! The bracketed bytes are the `CheckMetadataHash` extension (mode disabled,
//! no hash), signed from `metadata_hash_since_spec` on. From
//! `multi_address_since_spec` on, the destination and signer are
//! `MultiAddress::Id` and carry a leading `0x00`.

use alloy_primitives::U256;
use blake2b_simd::Params;
use chain_params::SubstrateParams;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use wire_codec::compact;

use crate::address::decode_address;
use crate::era::Era;
use crate::error::DotError;

const SIGNED_V4: u8 = 0x84;
const MULTI_ADDRESS_ID: u8 = 0x00;
const SIGNATURE_ED25519: u8 = 0x00;
const METADATA_HASH_DISABLED: u8 = 0x00;
const OPTION_NONE: u8 = 0x00;

/// Payloads longer than this are signed as their BLAKE2b-256 hash.
const MAX_UNHASHED_PAYLOAD: usize = 256;

/// Per-transaction chain state read from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    pub spec_version: u32,
    pub transaction_version: u32,
    pub block_hash: [u8; 32],
    pub block_number: u64,
    pub nonce: u64,
    pub era_period: u64,
    pub tip: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedExtrinsic {
    pub call: Vec<u8>,
    pub extra: Vec<u8>,
    /// Exactly the bytes the signer signs.
    pub signing_payload: Vec<u8>,
    pub signer: [u8; 32],
    multi_address: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExtrinsic {
    pub raw_tx: Vec<u8>,
    /// `0x`-prefixed BLAKE2b-256 of `raw_tx`.
    pub tx_hash: String,
}

fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let hash = Params::new().hash_length(32).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    out
}

fn transfer_call(params: &SubstrateParams, dest: &[u8; 32], amount: u128, multi: bool) -> Vec<u8> {
    let mut call = params.transfer_call_index.to_vec();
    if multi {
        call.push(MULTI_ADDRESS_ID);
    }
    call.extend_from_slice(dest);
    call.extend(compact::encode_u256(U256::from(amount)));
    call
}

fn seal_payload(payload: Vec<u8>) -> Vec<u8> {
    if payload.len() > MAX_UNHASHED_PAYLOAD {
        blake2b_256(&payload).to_vec()
    } else {
        payload
    }
}

/// Builds a transfer of `amount` planck from `signer` to `destination`.
pub fn build_transfer(
    params: &SubstrateParams,
    signer: &[u8],
    destination: &str,
    amount: u128,
    state: &ChainState,
) -> Result<UnsignedExtrinsic, DotError> {
    let signer: [u8; 32] = signer.try_into().map_err(|_| {
        DotError::InvalidPublicKey(format!("expected 32 bytes, got {}", signer.len()))
    })?;
    if amount == 0 {
        return Err(DotError::TransactionBuildError("amount must be > 0".into()));
    }
    let dest = decode_address(destination, params)?;
    let genesis = params
        .genesis_hash_bytes()
        .map_err(|e| DotError::TransactionBuildError(e.to_string()))?;

    let multi_address = state.spec_version >= params.multi_address_since_spec;
    let metadata_hash = state.spec_version >= params.metadata_hash_since_spec;

    let call = transfer_call(params, &dest, amount, multi_address);

    let mut extra = Era::mortal(state.block_number, state.era_period).encode();
    extra.extend(compact::encode_u64(state.nonce));
    extra.extend(compact::encode_u256(U256::from(state.tip)));
    if metadata_hash {
        extra.push(METADATA_HASH_DISABLED);
    }

    let mut payload = Vec::with_capacity(call.len() + extra.len() + 73);
    payload.extend_from_slice(&call);
    payload.extend_from_slice(&extra);
    payload.extend_from_slice(&state.spec_version.to_le_bytes());
    payload.extend_from_slice(&state.transaction_version.to_le_bytes());
    payload.extend_from_slice(&genesis);
    payload.extend_from_slice(&state.block_hash);
    if metadata_hash {
        payload.push(OPTION_NONE);
    }
    let payload = seal_payload(payload);

    tracing::debug!(
        chain = params.name,
        spec_version = state.spec_version,
        nonce = state.nonce,
        multi_address,
        metadata_hash,
        "built substrate transfer"
    );

    Ok(UnsignedExtrinsic {
        call,
        extra,
        signing_payload: payload,
        signer,
        multi_address,
    })
}

impl UnsignedExtrinsic {
    /// Assembles the signed extrinsic from a 64-byte Ed25519 signature over
    /// [`Self::signing_payload`].
    pub fn finalize(&self, signature: &[u8]) -> Result<SignedExtrinsic, DotError> {
        let sig = Signature::from_slice(signature)
            .map_err(|e| DotError::SigningError(format!("malformed signature: {e}")))?;
        let key = VerifyingKey::from_bytes(&self.signer)
            .map_err(|e| DotError::InvalidPublicKey(format!("{e}")))?;
        key.verify(&self.signing_payload, &sig)
            .map_err(|_| DotError::SigningError("signature does not verify".into()))?;
        Ok(self.assemble(&sig.to_bytes()))
    }

    /// The extrinsic with an all-zero signature. Fee estimation endpoints
    /// only need its length and weight, never a valid signature.
    pub fn fee_probe(&self) -> SignedExtrinsic {
        self.assemble(&[0u8; 64])
    }

    fn assemble(&self, signature: &[u8; 64]) -> SignedExtrinsic {
        let mut body = vec![SIGNED_V4];
        if self.multi_address {
            body.push(MULTI_ADDRESS_ID);
        }
        body.extend_from_slice(&self.signer);
        body.push(SIGNATURE_ED25519);
        body.extend_from_slice(signature);
        body.extend_from_slice(&self.extra);
        body.extend_from_slice(&self.call);

        let mut raw_tx = compact::encode_u64(body.len() as u64);
        raw_tx.extend(body);
        let tx_hash = format!("0x{}", hex::encode(blake2b_256(&raw_tx)));
        SignedExtrinsic { raw_tx, tx_hash }
    }
}
