//! Multi-chain wallet engine.
//!
//! Ties the per-family chain crates and the provider layer together behind
//! one [`WalletManager`] per chain account. Key custody stays outside the
//! engine: transactions are handed to a caller-supplied [`Signer`] as
//! digests or messages, and only public keys ever reach this crate.
//!
//! Configuration is TOML ([`WalletConfig`]), logging goes through `tracing`
//! ([`logging::init_tracing`]), and every fallible operation returns a
//! [`WalletError`].

pub mod address;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod fee;
pub mod logging;
pub mod manager;
pub mod signer;
pub mod transaction;
pub mod types;

pub use chain_params::{AddressType, Chain, ChainFamily, NetworkParameters};
pub use config::{ChainConfig, EndpointConfig, WalletConfig};
pub use error::{AddressError, BuildError, SignError, WalletError};
pub use manager::WalletManager;
pub use signer::{LocalKeySigner, PayloadKind, SignRequest, Signer};
pub use transaction::{SignedTransaction, TransactionRecord, TransactionState};
pub use types::{AccountState, Address, Fee, FeeParameters, FeeTier, PublicKey, TransferIntent};
