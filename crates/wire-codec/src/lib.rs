//! Chain-agnostic binary codecs shared by every chain crate in the wallet.
//!
//! Each module is one wire primitive with an independent encode/decode pair.
//! Encoders are total; decoders return [`CodecError`] and never read past
//! the end of their input.

pub mod bytes;
pub mod compact;
pub mod error;
pub mod int;
pub mod rlp;
pub mod ss58;
pub mod tlv;

pub use error::CodecError;
pub use rlp::RlpItem;
pub use tlv::Tlv;
