//! SS58 account addresses for Ed25519 keys.

use chain_params::SubstrateParams;
use wire_codec::{ss58, CodecError};

use crate::error::DotError;

pub fn address_from_pubkey(pubkey: &[u8], params: &SubstrateParams) -> Result<String, DotError> {
    if pubkey.len() != ss58::ACCOUNT_LEN {
        return Err(DotError::InvalidPublicKey(format!(
            "expected 32 bytes, got {}",
            pubkey.len()
        )));
    }
    ss58::encode(pubkey, params.ss58_network_type)
        .map_err(|e| DotError::InvalidAddress(format!("ss58 encode: {e}")))
}

/// Account id behind `address`, which must carry the network's SS58 type.
pub fn decode_address(address: &str, params: &SubstrateParams) -> Result<[u8; 32], DotError> {
    let decoded = ss58::decode(address).map_err(|e| match e {
        CodecError::ValidationFailed(m) => DotError::InvalidChecksum(m),
        other => DotError::InvalidAddress(other.to_string()),
    })?;
    if decoded.network_type != params.ss58_network_type {
        return Err(DotError::WrongNetwork {
            expected: params.ss58_network_type,
            actual: decoded.network_type,
        });
    }
    Ok(decoded.account)
}

pub fn validate_address(address: &str, params: &SubstrateParams) -> bool {
    decode_address(address, params).is_ok()
}
