use thiserror::Error;

/// UTXO chain operation errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("wrong network: {0}")]
    WrongNetwork(String),

    #[error("no unspent outputs available")]
    NoUnspentOutputs,

    #[error("insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("amount {amount} is below the dust threshold {dust}")]
    DustAmount { amount: u64, dust: u64 },

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_public_key() {
        let err = BtcError::InvalidPublicKey("not on curve".into());
        assert_eq!(err.to_string(), "invalid public key: not on curve");
    }

    #[test]
    fn display_invalid_address() {
        let err = BtcError::InvalidAddress("bad length".into());
        assert_eq!(err.to_string(), "invalid address: bad length");
    }

    #[test]
    fn display_invalid_checksum() {
        let err = BtcError::InvalidChecksum("base58".into());
        assert_eq!(err.to_string(), "invalid checksum: base58");
    }

    #[test]
    fn display_wrong_network() {
        let err = BtcError::WrongNetwork("prefix 0x32".into());
        assert_eq!(err.to_string(), "wrong network: prefix 0x32");
    }

    #[test]
    fn display_insufficient_funds() {
        let err = BtcError::InsufficientFunds {
            available: 1_000,
            required: 50_141,
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: have 1000 sat, need 50141 sat"
        );
    }

    #[test]
    fn display_dust_amount() {
        let err = BtcError::DustAmount {
            amount: 100,
            dust: 546,
        };
        assert_eq!(err.to_string(), "amount 100 is below the dust threshold 546");
    }

    #[test]
    fn display_signing_error() {
        let err = BtcError::SigningError("sighash failed".into());
        assert_eq!(err.to_string(), "signing error: sighash failed");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(BtcError::NoUnspentOutputs);
        assert!(err.to_string().contains("unspent"));
    }

    #[test]
    fn debug_format_works() {
        let err = BtcError::TransactionBuildError("fail".into());
        let debug = format!("{:?}", err);
        assert!(debug.contains("TransactionBuildError"));
    }
}
