//! Static per-network constants for every chain the wallet engine supports.
//!
//! Parameters are plain `'static` data. [`Registry::load`] validates the whole
//! table once at startup; afterwards every component borrows the same
//! immutable entries.

pub mod chain;
pub mod cosmos;
pub mod error;
pub mod evm;
pub mod fee;
pub mod registry;
pub mod solana;
pub mod substrate;
pub mod utxo;

pub use chain::{AddressType, Chain, ChainFamily, Curve};
pub use cosmos::CosmosParams;
pub use error::ParamsError;
pub use evm::EvmParams;
pub use fee::{FeeMultipliers, Ratio};
pub use registry::{evm_chain_by_id, parameters, NetworkParameters, Registry};
pub use solana::SolanaParams;
pub use substrate::SubstrateParams;
pub use utxo::UtxoParams;
