//! Address derivation and validation for every UTXO network.
//!
//! The `bitcoin` crate's `Address` type only knows Bitcoin's own networks, so
//! addresses are encoded here from the network's [`UtxoParams`] (base58check
//! version bytes and bech32 HRP) and turned into `bitcoin` scripts for the
//! transaction builder.

use bech32::primitives::decode::SegwitHrpstringError;
use bech32::{segwit, Hrp};
use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::{OP_CHECKMULTISIG, OP_PUSHNUM_1, OP_PUSHNUM_2};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::{PubkeyHash, ScriptBuf, ScriptHash, WitnessProgram, WitnessVersion};
use chain_params::UtxoParams;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::BtcError;

/// RIPEMD160(SHA256(data)).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

fn parse_pubkey(pubkey: &[u8]) -> Result<bitcoin::PublicKey, BtcError> {
    bitcoin::PublicKey::from_slice(pubkey)
        .map_err(|e| BtcError::InvalidPublicKey(format!("failed to parse public key: {e}")))
}

/// Returns the 33-byte compressed form of a 33- or 65-byte secp256k1 key.
pub fn compress_pubkey(pubkey: &[u8]) -> Result<[u8; 33], BtcError> {
    Ok(parse_pubkey(pubkey)?.inner.serialize())
}

fn base58check(version: u8, payload: &[u8; 20]) -> String {
    let mut data = Vec::with_capacity(21);
    data.push(version);
    data.extend_from_slice(payload);
    bs58::encode(data).with_check().into_string()
}

fn hrp(params: &UtxoParams) -> Result<Option<Hrp>, BtcError> {
    params
        .bech32_hrp
        .map(|h| {
            Hrp::parse(h).map_err(|e| BtcError::InvalidAddress(format!("bad hrp {h:?}: {e}")))
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Base58check P2PKH address of the key exactly as given.
///
/// An uncompressed key hashes to a different address than its compressed
/// form; both are valid and the caller decides which one it owns.
pub fn legacy_address(pubkey: &[u8], params: &UtxoParams) -> Result<String, BtcError> {
    parse_pubkey(pubkey)?;
    Ok(base58check(params.p2pkh_prefix, &hash160(pubkey)))
}

/// Native SegWit v0 P2WPKH address. The key is compressed before hashing.
pub fn segwit_address(pubkey: &[u8], params: &UtxoParams) -> Result<String, BtcError> {
    let hrp = hrp(params)?.ok_or_else(|| {
        BtcError::InvalidAddress(format!("{} has no segwit addresses", params.name))
    })?;
    let compressed = compress_pubkey(pubkey)?;
    segwit::encode_v0(hrp, &hash160(&compressed))
        .map_err(|e| BtcError::InvalidAddress(format!("bech32 encoding failed: {e}")))
}

/// The network's preferred single-key address: SegWit where supported,
/// otherwise P2PKH.
pub fn default_address(pubkey: &[u8], params: &UtxoParams) -> Result<String, BtcError> {
    if params.supports_segwit() {
        segwit_address(pubkey, params)
    } else {
        legacy_address(&compress_pubkey(pubkey)?, params)
    }
}

/// `OP_1 <key> <key> OP_2 OP_CHECKMULTISIG` over the compressed keys in
/// lexicographic order.
pub fn multisig_redeem_script(first: &[u8], second: &[u8]) -> Result<ScriptBuf, BtcError> {
    let mut keys = [compress_pubkey(first)?, compress_pubkey(second)?];
    keys.sort();

    let mut builder = Builder::new().push_opcode(OP_PUSHNUM_1);
    for key in keys {
        let push = PushBytesBuf::try_from(key.to_vec())
            .map_err(|e| BtcError::InvalidPublicKey(format!("key push: {e}")))?;
        builder = builder.push_slice(push);
    }
    Ok(builder
        .push_opcode(OP_PUSHNUM_2)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script())
}

/// Addresses of a 1-of-2 multisig pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigAddresses {
    pub p2sh: String,
    /// `None` on networks without SegWit.
    pub p2wsh: Option<String>,
}

pub fn multisig_addresses(
    first: &[u8],
    second: &[u8],
    params: &UtxoParams,
) -> Result<MultisigAddresses, BtcError> {
    let script = multisig_redeem_script(first, second)?;
    let p2sh = base58check(params.p2sh_prefix, &hash160(script.as_bytes()));
    let p2wsh = match hrp(params)? {
        Some(hrp) => {
            let program: [u8; 32] = Sha256::digest(script.as_bytes()).into();
            Some(
                segwit::encode_v0(hrp, &program)
                    .map_err(|e| BtcError::InvalidAddress(format!("bech32 encoding failed: {e}")))?,
            )
        }
        None => None,
    };
    Ok(MultisigAddresses { p2sh, p2wsh })
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A parsed address, independent of its text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedAddress {
    P2pkh([u8; 20]),
    P2sh([u8; 20]),
    Segwit { version: u8, program: Vec<u8> },
}

impl DecodedAddress {
    /// The locking script paying to this address.
    pub fn script_pubkey(&self) -> Result<ScriptBuf, BtcError> {
        match self {
            DecodedAddress::P2pkh(hash) => {
                Ok(ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*hash)))
            }
            DecodedAddress::P2sh(hash) => {
                Ok(ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(*hash)))
            }
            DecodedAddress::Segwit { version, program } => {
                let version = WitnessVersion::try_from(*version)
                    .map_err(|e| BtcError::InvalidAddress(format!("witness version: {e}")))?;
                let program = WitnessProgram::new(version, program)
                    .map_err(|e| BtcError::InvalidAddress(format!("witness program: {e}")))?;
                Ok(ScriptBuf::new_witness_program(&program))
            }
        }
    }
}

/// Parses `address` as belonging to the network described by `params`.
///
/// A well-formed address with a valid checksum but another network's prefix
/// is reported as [`BtcError::WrongNetwork`].
pub fn decode_address(address: &str, params: &UtxoParams) -> Result<DecodedAddress, BtcError> {
    if let Some(hrp) = params.bech32_hrp {
        let lower = address.to_ascii_lowercase();
        if lower.starts_with(&format!("{hrp}1")) {
            return decode_segwit(address, hrp);
        }
    }
    if let Ok((hrp, _, _)) = segwit::decode(address) {
        return Err(BtcError::WrongNetwork(format!(
            "segwit address for hrp {}",
            hrp.to_lowercase()
        )));
    }
    decode_base58(address, params)
}

fn decode_segwit(address: &str, expected_hrp: &str) -> Result<DecodedAddress, BtcError> {
    let (hrp, version, program) = segwit::decode(address).map_err(map_segwit_error)?;
    if hrp.to_lowercase() != expected_hrp {
        return Err(BtcError::WrongNetwork(format!(
            "hrp {} does not match {expected_hrp}",
            hrp.to_lowercase()
        )));
    }
    Ok(DecodedAddress::Segwit {
        version: version.to_u8(),
        program,
    })
}

fn map_segwit_error(e: segwit::DecodeError) -> BtcError {
    match &e.0 {
        SegwitHrpstringError::Checksum(_) => {
            BtcError::InvalidChecksum(format!("bech32 checksum: {e}"))
        }
        _ => BtcError::InvalidAddress(format!("bech32: {e}")),
    }
}

fn decode_base58(address: &str, params: &UtxoParams) -> Result<DecodedAddress, BtcError> {
    let data = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| match e {
            bs58::decode::Error::InvalidChecksum { .. } => {
                BtcError::InvalidChecksum(format!("base58check: {e}"))
            }
            other => BtcError::InvalidAddress(format!("base58: {other}")),
        })?;

    if data.len() != 21 {
        return Err(BtcError::InvalidAddress(format!(
            "base58 payload is {} bytes, expected 21",
            data.len()
        )));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&data[1..]);

    match data[0] {
        v if v == params.p2pkh_prefix => Ok(DecodedAddress::P2pkh(hash)),
        v if v == params.p2sh_prefix => Ok(DecodedAddress::P2sh(hash)),
        v => Err(BtcError::WrongNetwork(format!(
            "version byte {v:#04x} is not used by {}",
            params.name
        ))),
    }
}

/// Whether `address` is a valid address on this network.
pub fn validate_address(address: &str, params: &UtxoParams) -> bool {
    decode_address(address, params).is_ok()
}
