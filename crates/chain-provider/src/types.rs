//! Backend-neutral response types.

use serde::{Deserialize, Serialize};

/// Where a broadcast transaction stands according to one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TxStatus {
    /// Unknown to the backend or not yet included.
    Pending,
    Confirmed { block: Option<u64> },
    Failed { reason: String },
}

/// An unspent output as reported by an indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    pub confirmed: bool,
}
