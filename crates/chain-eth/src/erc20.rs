//! ERC-20 calldata encoding.

use alloy_primitives::U256;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// First four bytes of Keccak-256 over a canonical function signature.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// `transfer(address,uint256)` calldata: selector, then the recipient
/// left-padded to a 32-byte word, then the amount as a big-endian word.
pub fn transfer_calldata(to: &[u8; 20], amount: U256) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&function_selector("transfer(address,uint256)"));
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(to);
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    data
}

/// Reads back the recipient and amount of `transfer` calldata.
pub fn decode_transfer(data: &[u8]) -> Result<([u8; 20], U256), EthError> {
    if data.len() != 68 {
        return Err(EthError::EncodingError(format!(
            "transfer calldata must be 68 bytes, got {}",
            data.len()
        )));
    }
    if data[..4] != function_selector("transfer(address,uint256)") {
        return Err(EthError::EncodingError("not a transfer call".into()));
    }
    if data[4..16].iter().any(|&b| b != 0) {
        return Err(EthError::EncodingError("address word has dirty padding".into()));
    }
    let mut to = [0u8; 20];
    to.copy_from_slice(&data[16..36]);
    Ok((to, U256::from_be_slice(&data[36..68])))
}
