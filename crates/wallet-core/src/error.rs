use chain_btc::BtcError;
use chain_cosmos::CosmosError;
use chain_dot::DotError;
use chain_eth::EthError;
use chain_params::ParamsError;
use chain_provider::ProviderError;
use chain_sol::SolError;
use thiserror::Error;

/// Address derivation and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("wrong network type: {0}")]
    WrongNetworkType(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// Transaction assembly and fee estimation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: u128, required: u128 },

    #[error("no unspent outputs available")]
    NoUnspentOutputs,

    #[error("fee data unavailable: {0}")]
    FeeDataUnavailable(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("{chain} build failed: {reason}")]
    Chain { chain: String, reason: String },
}

/// Failures reported by the external signer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("signing rejected by user")]
    RejectedByUser,

    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),
}

/// Everything the wallet manager can fail with.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),
}

impl From<ParamsError> for WalletError {
    fn from(e: ParamsError) -> Self {
        match e {
            ParamsError::UnsupportedChain(m) => WalletError::UnsupportedChain(m),
            other => WalletError::Config(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain errors into the taxonomy
// ---------------------------------------------------------------------------

fn chain_failure(chain: &str, e: impl std::fmt::Display) -> BuildError {
    BuildError::Chain {
        chain: chain.into(),
        reason: e.to_string(),
    }
}

impl From<BtcError> for BuildError {
    fn from(e: BtcError) -> Self {
        match e {
            BtcError::NoUnspentOutputs => BuildError::NoUnspentOutputs,
            BtcError::InsufficientFunds {
                available,
                required,
            } => BuildError::InsufficientFunds {
                available: available.into(),
                required: required.into(),
            },
            BtcError::DustAmount { .. } => BuildError::InvalidAmount(e.to_string()),
            BtcError::InvalidAddress(_)
            | BtcError::InvalidChecksum(_)
            | BtcError::WrongNetwork(_) => BuildError::InvalidDestination(e.to_string()),
            BtcError::SigningError(m) => BuildError::InvalidSignature(m),
            other => chain_failure("utxo", other),
        }
    }
}

impl From<EthError> for BuildError {
    fn from(e: EthError) -> Self {
        match e {
            EthError::FeeDataUnavailable(m) => BuildError::FeeDataUnavailable(m),
            EthError::InvalidAddress(_) | EthError::InvalidChecksum(_) => {
                BuildError::InvalidDestination(e.to_string())
            }
            EthError::SigningError(m) => BuildError::InvalidSignature(m),
            other => chain_failure("evm", other),
        }
    }
}

impl From<CosmosError> for BuildError {
    fn from(e: CosmosError) -> Self {
        match e {
            CosmosError::InvalidAddress(_)
            | CosmosError::InvalidChecksum(_)
            | CosmosError::WrongNetwork(_) => BuildError::InvalidDestination(e.to_string()),
            CosmosError::SigningError(m) => BuildError::InvalidSignature(m),
            other => chain_failure("cosmos", other),
        }
    }
}

impl From<SolError> for BuildError {
    fn from(e: SolError) -> Self {
        match e {
            SolError::InvalidAddress(_) => BuildError::InvalidDestination(e.to_string()),
            SolError::SigningError(m) => BuildError::InvalidSignature(m),
            other => chain_failure("solana", other),
        }
    }
}

impl From<DotError> for BuildError {
    fn from(e: DotError) -> Self {
        match e {
            DotError::InvalidAddress(_)
            | DotError::InvalidChecksum(_)
            | DotError::WrongNetwork { .. } => BuildError::InvalidDestination(e.to_string()),
            DotError::SigningError(m) => BuildError::InvalidSignature(m),
            other => chain_failure("substrate", other),
        }
    }
}

impl From<BtcError> for AddressError {
    fn from(e: BtcError) -> Self {
        match e {
            BtcError::InvalidChecksum(m) => AddressError::InvalidChecksum(m),
            BtcError::WrongNetwork(m) => AddressError::WrongNetworkType(m),
            other => AddressError::MalformedInput(other.to_string()),
        }
    }
}

impl From<EthError> for AddressError {
    fn from(e: EthError) -> Self {
        match e {
            EthError::InvalidChecksum(m) => AddressError::InvalidChecksum(m),
            other => AddressError::MalformedInput(other.to_string()),
        }
    }
}

impl From<CosmosError> for AddressError {
    fn from(e: CosmosError) -> Self {
        match e {
            CosmosError::InvalidChecksum(m) => AddressError::InvalidChecksum(m),
            CosmosError::WrongNetwork(m) => AddressError::WrongNetworkType(m),
            other => AddressError::MalformedInput(other.to_string()),
        }
    }
}

impl From<SolError> for AddressError {
    fn from(e: SolError) -> Self {
        AddressError::MalformedInput(e.to_string())
    }
}

impl From<DotError> for AddressError {
    fn from(e: DotError) -> Self {
        match e {
            DotError::InvalidChecksum(m) => AddressError::InvalidChecksum(m),
            DotError::WrongNetwork { expected, actual } => AddressError::WrongNetworkType(
                format!("expected ss58 type {expected}, got {actual}"),
            ),
            other => AddressError::MalformedInput(other.to_string()),
        }
    }
}

macro_rules! via_build_error {
    ($($source:ty),*) => {
        $(
            impl From<$source> for WalletError {
                fn from(e: $source) -> Self {
                    WalletError::Build(e.into())
                }
            }
        )*
    };
}

via_build_error!(BtcError, EthError, CosmosError, SolError, DotError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_address_errors() {
        assert_eq!(
            AddressError::InvalidChecksum("base58check".into()).to_string(),
            "invalid checksum: base58check"
        );
        assert_eq!(
            AddressError::WrongNetworkType("hrp tb".into()).to_string(),
            "wrong network type: hrp tb"
        );
        assert_eq!(
            AddressError::MalformedInput("empty".into()).to_string(),
            "malformed input: empty"
        );
    }

    #[test]
    fn display_build_errors() {
        let err = BuildError::InsufficientFunds {
            available: 10,
            required: 25,
        };
        assert_eq!(err.to_string(), "insufficient funds: have 10, need 25");
        assert_eq!(
            BuildError::InvalidState("record is Signed".into()).to_string(),
            "invalid state: record is Signed"
        );
        let err = BuildError::Chain {
            chain: "cosmos".into(),
            reason: "encoding error: envelope".into(),
        };
        assert_eq!(err.to_string(), "cosmos build failed: encoding error: envelope");
    }

    #[test]
    fn display_sign_errors() {
        assert_eq!(SignError::RejectedByUser.to_string(), "signing rejected by user");
        assert_eq!(
            SignError::SignerUnavailable("card removed".into()).to_string(),
            "signer unavailable: card removed"
        );
    }

    #[test]
    fn wallet_error_is_transparent() {
        let err: WalletError = SignError::RejectedByUser.into();
        assert_eq!(err.to_string(), "signing rejected by user");
        let err: WalletError = ProviderError::Timeout("utxos".into()).into();
        assert_eq!(err.to_string(), "timed out: utxos");
    }

    #[test]
    fn btc_errors_map_into_taxonomy() {
        assert_eq!(BuildError::from(BtcError::NoUnspentOutputs), BuildError::NoUnspentOutputs);
        assert_eq!(
            BuildError::from(BtcError::InsufficientFunds {
                available: 5,
                required: 9
            }),
            BuildError::InsufficientFunds {
                available: 5,
                required: 9
            }
        );
        assert!(matches!(
            AddressError::from(BtcError::WrongNetwork("tb".into())),
            AddressError::WrongNetworkType(_)
        ));
    }

    #[test]
    fn fee_data_survives_mapping() {
        let err: WalletError = EthError::FeeDataUnavailable("no gas price".into()).into();
        assert!(matches!(
            err,
            WalletError::Build(BuildError::FeeDataUnavailable(_))
        ));
    }

    #[test]
    fn dot_wrong_network_names_both_types() {
        let err = AddressError::from(DotError::WrongNetwork {
            expected: 0,
            actual: 42,
        });
        assert_eq!(err.to_string(), "wrong network type: expected ss58 type 0, got 42");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(BuildError::NoUnspentOutputs);
        assert_eq!(err.to_string(), "no unspent outputs available");
    }

    #[test]
    fn debug_format_works() {
        let err = SignError::SignerUnavailable("timeout".into());
        assert!(format!("{err:?}").contains("SignerUnavailable"));
    }
}
