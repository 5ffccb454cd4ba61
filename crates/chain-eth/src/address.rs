use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Derives the EIP-55 checksummed address of a secp256k1 public key.
///
/// Accepts the 33-byte compressed or 65-byte uncompressed SEC1 form. The
/// address is the low 20 bytes of Keccak-256 over the 64-byte `X || Y`.
pub fn address_from_pubkey(pubkey: &[u8]) -> Result<String, EthError> {
    Ok(checksum_encode(&address_bytes(pubkey)?))
}

/// Raw 20-byte address of a secp256k1 public key.
pub fn address_bytes(pubkey: &[u8]) -> Result<[u8; 20], EthError> {
    let key = PublicKey::from_sec1_bytes(pubkey)
        .map_err(|e| EthError::InvalidPublicKey(format!("{e}")))?;
    let uncompressed = key.to_encoded_point(false);

    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}

/// EIP-55 mixed-case hex encoding of a raw address.
pub fn checksum_encode(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        // High nibble for even positions, low nibble for odd.
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses a `0x`-prefixed address.
///
/// All-lowercase and all-uppercase inputs carry no checksum and are accepted
/// as is; mixed-case input must match its EIP-55 encoding.
pub fn parse_address(address: &str) -> Result<[u8; 20], EthError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
    let mut raw = [0u8; 20];
    raw.copy_from_slice(&bytes);

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && checksum_encode(&raw)[2..] != *hex_part {
        return Err(EthError::InvalidChecksum(address.to_string()));
    }

    Ok(raw)
}

pub fn validate_address(address: &str) -> bool {
    parse_address(address).is_ok()
}
