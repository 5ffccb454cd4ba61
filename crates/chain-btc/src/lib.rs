//! UTXO chain support for the wallet engine.
//!
//! Covers Bitcoin, Bitcoin testnet, Litecoin and Dogecoin: address
//! derivation and validation, fee-rate tiers, coin selection, and
//! building and finalizing P2PKH and P2WPKH spends. Network constants
//! come from `chain_params::UtxoParams`.

pub mod address;
pub mod error;
pub mod fee;
pub mod transaction;
pub mod utxo;

pub use error::BtcError;
pub use fee::SpendKind;
pub use transaction::{build_transaction, SignedBtcTx, UnsignedBtcTx};
pub use utxo::{select_utxos, Utxo, UtxoSelection};
