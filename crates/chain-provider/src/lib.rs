//! Redundant remote data sources behind one logical provider per chain.
//!
//! Every chain is served by an ordered list of [`Endpoint`]s. The
//! [`Multiplexer`] walks that list with failover and bounded retries for
//! reads, fans per-address reads out concurrently, and broadcasts through a
//! single endpoint so a transaction is never pushed twice behind the
//! caller's back.
//!
//! Each chain family has a module holding a closed target enum (what to
//! request), pure response parsers (how to read the answer), and a thin
//! typed provider built on the multiplexer:
//!
//! | module | backend |
//! |---|---|
//! | [`esplora`] | Esplora REST (Bitcoin, Litecoin, Dogecoin indexers) |
//! | [`evm`] | Ethereum JSON-RPC |
//! | [`cosmos`] | Cosmos SDK LCD REST |
//! | [`solana`] | Solana JSON-RPC |
//! | [`sidecar`] | Substrate API sidecar |

pub mod cosmos;
pub mod endpoint;
pub mod error;
pub mod esplora;
pub mod evm;
pub mod jsonrpc;
pub mod multiplexer;
pub mod sidecar;
pub mod solana;
pub mod target;
pub mod transport;
pub mod types;

pub use endpoint::{ApiKey, Capability, Endpoint, EndpointHealth, Health};
pub use error::ProviderError;
pub use multiplexer::{Multiplexer, MultiplexerConfig};
pub use target::{Body, HttpMethod, Target};
pub use transport::{HttpTransport, Request, Response, Transport};
pub use types::{TxStatus, UtxoEntry};
