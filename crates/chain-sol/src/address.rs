//! Solana addresses are the Base58 encoding of a 32-byte Ed25519 public key.
//! There is no hashing step and no checksum.

use crate::error::SolError;

/// Address of an Ed25519 public key.
pub fn address_from_pubkey(pubkey: &[u8]) -> Result<String, SolError> {
    let key: [u8; 32] = pubkey.try_into().map_err(|_| {
        SolError::InvalidPublicKey(format!("expected 32 bytes, got {}", pubkey.len()))
    })?;
    Ok(bytes_to_address(&key))
}

pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decodes an address to its 32 key bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

pub fn validate_address(address: &str) -> bool {
    address_to_bytes(address).is_ok()
}
