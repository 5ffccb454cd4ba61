//! Solana chain support for the wallet engine.
//!
//! The wire format is implemented by hand on top of `ed25519-dalek` and
//! `bs58`: legacy and v0 messages, native SOL transfers, and address lookup
//! table splitting and rebuilding.

pub mod address;
pub mod alt;
pub mod error;
pub mod message;
pub mod short_vec;
pub mod transaction;

pub use address::{address_from_pubkey, address_to_bytes, bytes_to_address, validate_address};
pub use alt::{rebuild_with_lookup_table, split_account_keys, AccountKeySplit, LookupTableAccount};
pub use error::SolError;
pub use message::{Message, MessageVersion};
pub use transaction::{build_sol_transfer, parse_transaction, SignedSolTx, UnsignedSolTx};
