//! Cosmos SDK chain support for the wallet engine.
//!
//! Bech32 account addresses, a `MsgSend` transaction builder that produces
//! the `SIGN_MODE_DIRECT` digest, and the JSON broadcast envelope the LCD
//! `/cosmos/tx/v1beta1/txs` endpoint accepts. Chain constants come from
//! `chain_params::CosmosParams`.

pub mod address;
pub mod error;
pub mod fee;
pub mod proto;
pub mod transaction;

pub use error::CosmosError;
pub use transaction::{build_send, Coin, CosmosSend, SignedCosmosTx, UnsignedCosmosTx};
