//! Bech32 account addresses: `hrp1` + bech32(HASH160(compressed pubkey)).

use bech32::primitives::decode::{CheckedHrpstring, CheckedHrpstringError};
use bech32::{Bech32, Hrp};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::CosmosError;

/// Returns the 33-byte compressed form of a 33- or 65-byte secp256k1 key.
pub fn compress_pubkey(pubkey: &[u8]) -> Result<[u8; 33], CosmosError> {
    let key = PublicKey::from_sec1_bytes(pubkey)
        .map_err(|e| CosmosError::InvalidPublicKey(format!("failed to parse public key: {e}")))?;
    let mut out = [0u8; 33];
    out.copy_from_slice(key.to_encoded_point(true).as_bytes());
    Ok(out)
}

/// Account address of `pubkey` under `hrp`.
pub fn address_from_pubkey(pubkey: &[u8], hrp: &str) -> Result<String, CosmosError> {
    let compressed = compress_pubkey(pubkey)?;
    let hash: [u8; 20] = Ripemd160::digest(Sha256::digest(compressed)).into();
    let hrp = Hrp::parse(hrp)
        .map_err(|e| CosmosError::InvalidAddress(format!("bad hrp {hrp:?}: {e}")))?;
    bech32::encode::<Bech32>(hrp, &hash)
        .map_err(|e| CosmosError::InvalidAddress(format!("bech32 encode failed: {e}")))
}

/// Decodes an account address, requiring `expected_hrp` and a 20-byte payload.
pub fn decode_address(address: &str, expected_hrp: &str) -> Result<[u8; 20], CosmosError> {
    let checked = CheckedHrpstring::new::<Bech32>(address).map_err(|e| match e {
        CheckedHrpstringError::Checksum(_) => {
            CosmosError::InvalidChecksum(format!("{address}: {e}"))
        }
        _ => CosmosError::InvalidAddress(format!("{address}: {e}")),
    })?;
    if !checked.hrp().as_str().eq_ignore_ascii_case(expected_hrp) {
        return Err(CosmosError::WrongNetwork(format!(
            "expected prefix {expected_hrp:?}, got {:?}",
            checked.hrp().as_str()
        )));
    }
    let payload: Vec<u8> = checked.byte_iter().collect();
    payload.as_slice().try_into().map_err(|_| {
        CosmosError::InvalidAddress(format!("payload is {} bytes, expected 20", payload.len()))
    })
}

pub fn validate_address(address: &str, expected_hrp: &str) -> bool {
    decode_address(address, expected_hrp).is_ok()
}
