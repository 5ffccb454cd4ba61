use std::cmp::Ordering;

use alloy_primitives::U256;
use bip32::{ChildNumber, ExtendedKey, ExtendedKeyAttrs, Prefix, XPub};
use chain_params::{AddressType, Chain};
use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// How the raw bytes of a [`PublicKey`] become the account key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDerivation {
    /// The bytes are the account key itself.
    #[default]
    None,
    /// The bytes are a compressed secp256k1 key followed by a 32-byte chain
    /// code; `path` is walked with BIP32 public derivation.
    Hierarchical,
}

/// A caller-owned public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    pub bytes: Vec<u8>,
    /// Non-hardened child indexes, only meaningful for hierarchical keys.
    #[serde(default)]
    pub path: Vec<u32>,
    #[serde(default)]
    pub derivation: KeyDerivation,
}

impl PublicKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            path: Vec::new(),
            derivation: KeyDerivation::None,
        }
    }

    /// A 33-byte compressed key plus chain code, derived along `path`.
    pub fn hierarchical(key: &[u8; 33], chain_code: &[u8; 32], path: &[u32]) -> Self {
        let mut bytes = key.to_vec();
        bytes.extend_from_slice(chain_code);
        Self {
            bytes,
            path: path.to_vec(),
            derivation: KeyDerivation::Hierarchical,
        }
    }

    /// The key addresses are derived from.
    pub fn account_key(&self) -> Result<Vec<u8>, AddressError> {
        match self.derivation {
            KeyDerivation::None => Ok(self.bytes.clone()),
            KeyDerivation::Hierarchical => self.derive_child(),
        }
    }

    fn derive_child(&self) -> Result<Vec<u8>, AddressError> {
        if self.bytes.len() != 65 {
            return Err(AddressError::MalformedInput(format!(
                "hierarchical key must be 33 key bytes plus a 32-byte chain code, got {} bytes",
                self.bytes.len()
            )));
        }
        let mut key_bytes = [0u8; 33];
        key_bytes.copy_from_slice(&self.bytes[..33]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&self.bytes[33..]);

        let root = ExtendedKey {
            prefix: Prefix::XPUB,
            attrs: ExtendedKeyAttrs {
                depth: 0,
                parent_fingerprint: [0u8; 4],
                child_number: ChildNumber(0),
                chain_code,
            },
            key_bytes,
        };
        let mut xpub = XPub::try_from(root)
            .map_err(|e| AddressError::MalformedInput(format!("extended key: {e}")))?;
        for &index in &self.path {
            let child = ChildNumber::new(index, false)
                .map_err(|e| AddressError::MalformedInput(format!("child {index}: {e}")))?;
            xpub = xpub
                .derive_child(child)
                .map_err(|e| AddressError::MalformedInput(format!("child {index}: {e}")))?;
        }
        Ok(xpub.to_bytes().to_vec())
    }
}

/// A derived address. Addresses order by type first, `Default` before `Legacy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub value: String,
    pub address_type: AddressType,
    pub public_key: PublicKey,
    pub label: String,
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address_type
            .cmp(&other.address_type)
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An unspent output owned by the account, as a provider reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    pub amount: u64,
    pub address: String,
    pub confirmed: bool,
}

/// A snapshot of one account. Amounts are in the chain's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub chain: Chain,
    pub address: String,
    pub balance: U256,
    /// Nonce, sequence or next account index; `None` on UTXO chains.
    pub nonce: Option<u64>,
    /// Cosmos account number, once the chain knows the account.
    pub account_number: Option<u64>,
    pub unspent_outputs: Vec<UnspentOutput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTier {
    Slow,
    Market,
    Fast,
}

impl FeeTier {
    pub const ALL: [FeeTier; 3] = [FeeTier::Slow, FeeTier::Market, FeeTier::Fast];
}

/// Chain-specific pricing behind a fee quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FeeParameters {
    Utxo {
        rate_per_vbyte: u64,
    },
    EvmLegacy {
        gas_price: U256,
        gas_limit: u64,
    },
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
        gas_limit: u64,
    },
    Cosmos {
        gas_limit: u64,
    },
    Solana {
        lamports_per_signature: u64,
    },
    Substrate {
        partial_fee: u128,
    },
}

/// One fee quote: the total it costs plus the parameters to build with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub tier: FeeTier,
    /// Upper bound of the total fee in the chain's smallest unit.
    pub amount: U256,
    pub parameters: FeeParameters,
}

/// What the user asked to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub amount: U256,
    pub destination: String,
    /// ERC-20 contract for token sends on EVM chains.
    #[serde(default)]
    pub token_contract: Option<String>,
    #[serde(default)]
    pub memo: String,
}

impl TransferIntent {
    pub fn new(amount: U256, destination: impl Into<String>) -> Self {
        Self {
            amount,
            destination: destination.into(),
            token_contract: None,
            memo: String::new(),
        }
    }
}
