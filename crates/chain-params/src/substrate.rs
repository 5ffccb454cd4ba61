//! Constants for Substrate relay chains.

use serde::Serialize;

use crate::error::ParamsError;

#[derive(Debug, Clone, Serialize)]
pub struct SubstrateParams {
    pub name: &'static str,
    /// SS58 address network type.
    pub ss58_network_type: u16,
    /// Genesis block hash, hex without `0x`.
    pub genesis_hash: &'static str,
    /// Pallet and call index of `balances.transfer`.
    pub transfer_call_index: [u8; 2],
    /// First runtime spec version whose calls take a `MultiAddress` destination.
    pub multi_address_since_spec: u32,
    /// First runtime spec version that signs the `CheckMetadataHash` extension.
    pub metadata_hash_since_spec: u32,
    pub existential_deposit: u128,
}

impl SubstrateParams {
    pub fn genesis_hash_bytes(&self) -> Result<[u8; 32], ParamsError> {
        let bytes = hex::decode(self.genesis_hash).map_err(|e| ParamsError::Invalid {
            chain: self.name.to_string(),
            reason: format!("genesis hash is not hex: {e}"),
        })?;
        bytes.try_into().map_err(|b: Vec<u8>| ParamsError::Invalid {
            chain: self.name.to_string(),
            reason: format!("genesis hash is {} bytes, expected 32", b.len()),
        })
    }
}

pub const POLKADOT: SubstrateParams = SubstrateParams {
    name: "polkadot",
    ss58_network_type: 0,
    genesis_hash: "91b171bb158e2d3848fa23a9f1c25182fb8e20313b2c1eb49219da7a70ce90c3",
    transfer_call_index: [0x05, 0x00],
    multi_address_since_spec: 28,
    metadata_hash_since_spec: 1_002_000,
    existential_deposit: 10_000_000_000,
};

pub const KUSAMA: SubstrateParams = SubstrateParams {
    name: "kusama",
    ss58_network_type: 2,
    genesis_hash: "b0a8d493285c2df73290dfb7e61f870f17b41801197a149ca93654499ea3dafe",
    transfer_call_index: [0x04, 0x00],
    multi_address_since_spec: 2028,
    metadata_hash_since_spec: 1_002_000,
    existential_deposit: 333_333_333,
};

pub const WESTEND: SubstrateParams = SubstrateParams {
    name: "westend",
    ss58_network_type: 42,
    genesis_hash: "e143f23803ac50e8f6f8e62695d1ce9e4e1d68aa36c1cd2cfd15340213f3423e",
    transfer_call_index: [0x04, 0x00],
    multi_address_since_spec: 9000,
    metadata_hash_since_spec: 1_002_000,
    existential_deposit: 10_000_000_000,
};
