//! EVM chain support for the wallet engine.
//!
//! This crate provides:
//! - address derivation from secp256k1 public keys with EIP-55 checksums
//! - legacy (EIP-155) and EIP-1559 transaction building and finalization
//! - fee tiers from `eth_feeHistory` or `eth_gasPrice`
//! - ERC-20 `transfer` calldata

pub mod address;
pub mod erc20;
pub mod error;
pub mod fee;
pub mod transaction;

pub use error::EthError;
pub use transaction::{build_erc20_transfer, build_transfer, EthTransaction, FeeParams, SignedEthTransaction};
