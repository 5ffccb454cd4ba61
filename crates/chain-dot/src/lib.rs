//! Substrate relay chain support for the wallet engine.
//!
//! SS58 addresses, mortal eras, and signed `balances` transfer extrinsics
//! for Polkadot, Kusama and Westend. Which call encoding and which signed
//! extensions apply is decided by the runtime spec version, using the
//! thresholds in `chain_params::SubstrateParams`.

pub mod address;
pub mod era;
pub mod error;
pub mod extrinsic;

pub use era::Era;
pub use error::DotError;
pub use extrinsic::{build_transfer, ChainState, SignedExtrinsic, UnsignedExtrinsic};
