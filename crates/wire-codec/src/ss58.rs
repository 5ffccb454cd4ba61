//! SS58 address text encoding used by Substrate-based networks.
//!
//! ```text
//! base58( prefix (1 or 2 bytes) || account (32 bytes) || checksum (2 bytes) )
//! checksum = blake2b-512("SS58PRE" || prefix || account)[..2]
//! ```

use crate::error::CodecError;

/// Canonical account length carried inside an address.
pub const ACCOUNT_LEN: usize = 32;

const CHECKSUM_LEN: usize = 2;
const CHECKSUM_PREIMAGE: &[u8] = b"SS58PRE";

/// Largest network type representable with the two-byte prefix.
pub const MAX_NETWORK_TYPE: u16 = 0x3FFF;

/// Account id and network type recovered from an SS58 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ss58Address {
    pub network_type: u16,
    pub account: [u8; ACCOUNT_LEN],
}

/// Encodes `account` under `network_type`.
///
/// Accounts shorter than 32 bytes are left-padded with zeros; longer ones keep
/// their trailing 32 bytes.
pub fn encode(account: &[u8], network_type: u16) -> Result<String, CodecError> {
    let prefix = encode_prefix(network_type)?;
    let account = canonical_account(account);

    let mut payload = Vec::with_capacity(prefix.len() + ACCOUNT_LEN + CHECKSUM_LEN);
    payload.extend_from_slice(&prefix);
    payload.extend_from_slice(&account);
    let checksum = checksum(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    Ok(bs58::encode(payload).into_string())
}

/// Decodes an address, verifying its checksum.
///
/// A payload carrying fewer than 32 account bytes is rejected; a longer one is
/// truncated to its trailing 32 bytes.
pub fn decode(address: &str) -> Result<Ss58Address, CodecError> {
    let raw = bs58::decode(address)
        .into_vec()
        .map_err(|e| CodecError::WrongFormat(format!("ss58 base58: {e}")))?;

    let first = *raw
        .first()
        .ok_or_else(|| CodecError::IncompleteData("empty ss58 payload".into()))?;
    let (network_type, prefix_len) = match first {
        0..=63 => (first as u16, 1),
        64..=127 => {
            let second = *raw.get(1).ok_or_else(|| {
                CodecError::IncompleteData("ss58 two-byte prefix truncated".into())
            })?;
            let lower = ((first << 2) | (second >> 6)) as u16;
            let upper = (second & 0x3F) as u16;
            (lower | (upper << 8), 2)
        }
        _ => {
            return Err(CodecError::WrongFormat(format!(
                "invalid ss58 prefix byte {first:#04x}"
            )))
        }
    };

    if raw.len() < prefix_len + ACCOUNT_LEN + CHECKSUM_LEN {
        return Err(CodecError::IncompleteData(format!(
            "ss58 payload is {} bytes, account needs {ACCOUNT_LEN}",
            raw.len()
        )));
    }

    let (body, expected) = raw.split_at(raw.len() - CHECKSUM_LEN);
    let actual = checksum(body);
    if actual[..CHECKSUM_LEN] != *expected {
        return Err(CodecError::ValidationFailed("ss58 checksum mismatch".into()));
    }

    Ok(Ss58Address {
        network_type,
        account: canonical_account(&body[prefix_len..]),
    })
}

/// Returns the network type an address was encoded for.
pub fn network_type(address: &str) -> Result<u16, CodecError> {
    decode(address).map(|a| a.network_type)
}

/// Decodes an address and requires it to belong to `expected` network type.
pub fn decode_for(address: &str, expected: u16) -> Result<[u8; ACCOUNT_LEN], CodecError> {
    let decoded = decode(address)?;
    if decoded.network_type != expected {
        return Err(CodecError::ValidationFailed(format!(
            "ss58 network type {} does not match expected {expected}",
            decoded.network_type
        )));
    }
    Ok(decoded.account)
}

fn encode_prefix(network_type: u16) -> Result<Vec<u8>, CodecError> {
    match network_type {
        0..=63 => Ok(vec![network_type as u8]),
        64..=MAX_NETWORK_TYPE => {
            let first = (((network_type & 0x00FC) >> 2) as u8) | 0x40;
            let second = ((network_type >> 8) as u8) | (((network_type & 0x0003) as u8) << 6);
            Ok(vec![first, second])
        }
        _ => Err(CodecError::ValidationFailed(format!(
            "ss58 network type {network_type} exceeds {MAX_NETWORK_TYPE}"
        ))),
    }
}

fn canonical_account(account: &[u8]) -> [u8; ACCOUNT_LEN] {
    let mut out = [0u8; ACCOUNT_LEN];
    if account.len() >= ACCOUNT_LEN {
        out.copy_from_slice(&account[account.len() - ACCOUNT_LEN..]);
    } else {
        out[ACCOUNT_LEN - account.len()..].copy_from_slice(account);
    }
    out
}

fn checksum(body: &[u8]) -> [u8; 64] {
    let hash = blake2b_simd::Params::new()
        .hash_length(64)
        .to_state()
        .update(CHECKSUM_PREIMAGE)
        .update(body)
        .finalize();
    let mut out = [0u8; 64];
    out.copy_from_slice(hash.as_bytes());
    out
}
