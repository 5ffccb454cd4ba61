//! `MsgSend` transactions signed in `SIGN_MODE_DIRECT`.
//!
//! ```text
//! TxBody    { messages: [Any(MsgSend)], memo }
//! AuthInfo  { signer_infos: [SignerInfo { public_key, mode_info, sequence }], fee }
//! SignDoc   { body_bytes, auth_info_bytes, chain_id, account_number }
//! TxRaw     { body_bytes, auth_info_bytes, signatures: [r || s] }
//! ```
//!
//! The digest to sign is SHA-256 of the encoded `SignDoc`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chain_params::CosmosParams;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::{address_from_pubkey, compress_pubkey, decode_address};
use crate::error::CosmosError;
use crate::proto::{any, Message};

pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
pub const BROADCAST_MODE_SYNC: &str = "BROADCAST_MODE_SYNC";

const SIGN_MODE_DIRECT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    /// Base units; encoded as a decimal string on the wire.
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: &str, amount: u128) -> Self {
        Self {
            denom: denom.to_string(),
            amount,
        }
    }

    fn encode(&self) -> Message {
        Message::new()
            .string(1, &self.denom)
            .string(2, &self.amount.to_string())
    }
}

/// A single-coin transfer in the chain's fee denomination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmosSend {
    pub to: String,
    pub amount: u128,
    pub fee_amount: u128,
    pub gas_limit: u64,
    pub account_number: u64,
    pub sequence: u64,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedCosmosTx {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub sign_doc: Vec<u8>,
    pub digest: [u8; 32],
    pub public_key: [u8; 33],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCosmosTx {
    /// Encoded `TxRaw`.
    pub tx_bytes: Vec<u8>,
    /// JSON body for `POST /cosmos/tx/v1beta1/txs`.
    pub envelope: String,
    /// Upper-case hex SHA-256 of `tx_bytes`.
    pub tx_hash: String,
}

#[derive(Serialize)]
struct BroadcastEnvelope<'a> {
    tx_bytes: String,
    mode: &'a str,
}

fn msg_send(from: &str, to: &str, amount: &Coin) -> Message {
    let send = Message::new()
        .string(1, from)
        .string(2, to)
        .message(3, amount.encode());
    any(MSG_SEND_TYPE_URL, send)
}

fn auth_info(public_key: &[u8; 33], sequence: u64, fee: &Coin, gas_limit: u64) -> Message {
    let pubkey = any(SECP256K1_PUBKEY_TYPE_URL, Message::new().bytes(1, public_key));
    let single = Message::new().enumeration(1, SIGN_MODE_DIRECT);
    let signer_info = Message::new()
        .message(1, pubkey)
        .message(2, Message::new().message(1, single))
        .uint64(3, sequence);
    let fee = Message::new().message(1, fee.encode()).uint64(2, gas_limit);

    Message::new().message(1, signer_info).message(2, fee)
}

/// Builds an unsigned `MsgSend` from the account owning `public_key`.
pub fn build_send(
    params: &CosmosParams,
    send: &CosmosSend,
    public_key: &[u8],
) -> Result<UnsignedCosmosTx, CosmosError> {
    if send.amount == 0 {
        return Err(CosmosError::TransactionBuildError("amount must be > 0".into()));
    }
    if send.gas_limit == 0 {
        return Err(CosmosError::TransactionBuildError("gas limit must be > 0".into()));
    }
    decode_address(&send.to, params.bech32_hrp)?;

    let public_key = compress_pubkey(public_key)?;
    let from = address_from_pubkey(&public_key, params.bech32_hrp)?;

    let body_bytes = Message::new()
        .message(1, msg_send(&from, &send.to, &Coin::new(params.denom, send.amount)))
        .string(2, &send.memo)
        .into_bytes();
    let auth_info_bytes = auth_info(
        &public_key,
        send.sequence,
        &Coin::new(params.denom, send.fee_amount),
        send.gas_limit,
    )
    .into_bytes();

    let sign_doc = Message::new()
        .bytes(1, &body_bytes)
        .bytes(2, &auth_info_bytes)
        .string(3, params.chain_id)
        .uint64(4, send.account_number)
        .into_bytes();
    let digest: [u8; 32] = Sha256::digest(&sign_doc).into();

    tracing::debug!(
        chain_id = params.chain_id,
        account_number = send.account_number,
        sequence = send.sequence,
        "built cosmos send"
    );

    Ok(UnsignedCosmosTx {
        body_bytes,
        auth_info_bytes,
        sign_doc,
        digest,
        public_key,
    })
}

impl UnsignedCosmosTx {
    /// Wraps a signature over [`Self::digest`] into the broadcast envelope.
    ///
    /// Accepts `r || s` or `r || s || v`; the recovery byte is dropped. A
    /// high-S signature is normalized before it is written.
    pub fn finalize(&self, signature: &[u8]) -> Result<SignedCosmosTx, CosmosError> {
        let compact = match signature.len() {
            64 | 65 => &signature[..64],
            n => {
                return Err(CosmosError::SigningError(format!(
                    "expected 64 or 65 signature bytes, got {n}"
                )))
            }
        };
        let mut sig = Signature::from_slice(compact)
            .map_err(|e| CosmosError::SigningError(format!("malformed signature: {e}")))?;
        if let Some(normalized) = sig.normalize_s() {
            sig = normalized;
        }

        let key = VerifyingKey::from_sec1_bytes(&self.public_key)
            .map_err(|e| CosmosError::InvalidPublicKey(format!("{e}")))?;
        key.verify_prehash(&self.digest, &sig)
            .map_err(|_| CosmosError::SigningError("signature does not match digest".into()))?;

        let tx_bytes = self.tx_raw(&sig.to_bytes());

        let envelope = serde_json::to_string(&BroadcastEnvelope {
            tx_bytes: STANDARD.encode(&tx_bytes),
            mode: BROADCAST_MODE_SYNC,
        })
        .map_err(|e| CosmosError::EncodingError(format!("envelope: {e}")))?;
        let tx_hash = hex::encode_upper(Sha256::digest(&tx_bytes));

        Ok(SignedCosmosTx {
            tx_bytes,
            envelope,
            tx_hash,
        })
    }

    /// Base64 `TxRaw` with a zeroed signature, for `/cosmos/tx/v1beta1/simulate`.
    pub fn simulation_tx_bytes(&self) -> String {
        STANDARD.encode(self.tx_raw(&[0u8; 64]))
    }

    fn tx_raw(&self, signature: &[u8]) -> Vec<u8> {
        Message::new()
            .bytes(1, &self.body_bytes)
            .bytes(2, &self.auth_info_bytes)
            .repeated_bytes(3, &[signature])
            .into_bytes()
    }
}
